//! Scene Engine
//!
//! Picks at most one shared vignette per interaction. Candidates are gated
//! by time of day, participant and topic preconditions, and cooldowns;
//! runners-up are deferred into both participants' queues and may fire on
//! a later interaction between the same pair.

use rand::Rng;
use std::sync::Arc;

use social_events::{EventEntry, RecordId, SceneEvent, SceneKind};

use crate::character::{Character, QueuedScene, SocialState};
use crate::config::{in_window, MemoryConfig, SceneConfig};
use crate::embedding::SeedEmbedder;
use crate::memory::MemoryStore;
use crate::sanitize::TextFilter;
use crate::tables::scene_alias;

/// Fixed places and texts for each scene kind
pub mod scene_text {
    pub const SICK_WORDS: &[&str] = &["咳", "病", "体弱"];
    pub const POETRY_WORDS: &[&str] = &["诗", "吟", "诗话", "联句"];

    pub const SICK_VISIT_LOCATION: &str = "潇湘馆";
    pub const SICK_VISIT_SUMMARY: &str = "在潇湘馆探望身体不适之人";

    /// Poetry meets at the pavilion when the pair is already there
    pub const POETRY_PAVILION: &str = "沁芳亭";
    pub const POETRY_DEFAULT_LOCATION: &str = "回廊";

    pub const FAMILY_MEAL_LOCATION: &str = "正厅";
    pub const FAMILY_MEAL_SUMMARY: &str = "在正厅小聚用膳";

    pub const NIGHT_TALK_LOCATION: &str = "怡红院";
    pub const NIGHT_TALK_SUMMARY: &str = "夜里在怡红院低声交谈";

    /// Keyword attached to every scene record
    pub const SCENE_KEYWORD: &str = "场景";
}

use scene_text::*;

/// A scene that could fire for this interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCandidate {
    pub kind: SceneKind,
    pub location: String,
    /// Chance the candidate survives the selection pass
    pub probability: f64,
    pub summary: String,
}

/// Triggers scenes between pairs of characters.
pub struct SceneEngine {
    config: SceneConfig,
    memory: MemoryConfig,
    filter: Arc<dyn TextFilter>,
    embedder: SeedEmbedder,
}

impl SceneEngine {
    pub fn new(config: SceneConfig, memory: MemoryConfig, filter: Arc<dyn TextFilter>) -> Self {
        let embedder = SeedEmbedder::new(memory.embedding_dim);
        Self {
            config,
            memory,
            filter,
            embedder,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scene kinds whose window and preconditions hold, in kind order.
    ///
    /// Cooldowns are not consulted here. Precondition fallbacks draw from
    /// `rng` only when the keyword check did not already pass.
    pub fn candidates<R>(
        &self,
        rng: &mut R,
        hour: u32,
        names: [&str; 2],
        location: &str,
        summary: &str,
    ) -> Vec<SceneCandidate>
    where
        R: Rng + ?Sized,
    {
        let has = |who: &str| names.iter().any(|name| name.contains(who));
        let mentions = |words: &[&str]| words.iter().any(|word| summary.contains(word));
        let mut candidates = Vec::new();

        for &kind in SceneKind::all() {
            if !in_window(hour, self.config.windows.get(kind)) {
                continue;
            }
            let probability = self.config.base_probability(kind);
            let (scene_location, scene_summary) = match kind {
                SceneKind::SickVisit => {
                    if !has("黛玉") || !(mentions(SICK_WORDS) || rng.gen::<f64>() < probability) {
                        continue;
                    }
                    (SICK_VISIT_LOCATION.to_string(), SICK_VISIT_SUMMARY.to_string())
                }
                SceneKind::Poetry => {
                    if !(mentions(POETRY_WORDS) || rng.gen::<f64>() < probability) {
                        continue;
                    }
                    let place = if scene_alias(location) == POETRY_PAVILION {
                        POETRY_PAVILION
                    } else {
                        POETRY_DEFAULT_LOCATION
                    };
                    (place.to_string(), format!("在{place}吟诗联句"))
                }
                SceneKind::FamilyMeal => (FAMILY_MEAL_LOCATION.to_string(), FAMILY_MEAL_SUMMARY.to_string()),
                SceneKind::NightTalk => {
                    let joined = names.join(",");
                    if !joined.contains("宝玉")
                        || !(has("黛玉") || has("宝钗"))
                        || rng.gen::<f64>() >= probability
                    {
                        continue;
                    }
                    (NIGHT_TALK_LOCATION.to_string(), NIGHT_TALK_SUMMARY.to_string())
                }
            };
            candidates.push(SceneCandidate {
                kind,
                location: scene_location,
                probability,
                summary: scene_summary,
            });
        }
        candidates
    }

    /// Whether `state` may see `kind` again, alone and with `other`.
    pub fn cooldowns_allow(&self, state: &SocialState, other: &str, kind: SceneKind) -> bool {
        state.scene_cooldown_ok(kind, self.config.cooldown_minutes)
            && state.pair_cooldown_ok(other, kind, self.config.pair_cooldown_minutes)
    }

    /// Possibly fires a scene between `initiator` and `target`.
    ///
    /// A ready deferred scene shared by the pair is tried first; it is
    /// consumed even when a cooldown refuses it. Otherwise fresh candidates
    /// are drawn, one fires, and the rest are deferred for both characters.
    /// Cooldowns are read from the initiator and stamped on both.
    pub fn maybe_trigger_scene<R, A, B>(
        &self,
        rng: &mut R,
        initiator: &mut Character<A>,
        target: &mut Character<B>,
        location: &str,
        summary: &str,
    ) -> Option<SceneEvent>
    where
        R: Rng + ?Sized,
    {
        if let Some(item) = self.take_ready(rng, initiator, target) {
            if self.cooldowns_allow(&initiator.state, &target.name, item.kind) {
                tracing::debug!(kind = %item.kind, "deferred scene fired");
                return Some(self.fire(item.kind, &item.location, &item.summary, initiator, target));
            }
            tracing::trace!(kind = %item.kind, "deferred scene dropped on cooldown");
        }

        let now = initiator.now();
        let mut eligible: Vec<SceneCandidate> = self
            .candidates(rng, now.hour(), [initiator.name.as_str(), target.name.as_str()], location, summary)
            .into_iter()
            .filter(|c| self.cooldowns_allow(&initiator.state, &target.name, c.kind))
            .collect();
        if eligible.is_empty() {
            tracing::trace!(initiator = %initiator.name, target = %target.name, "no eligible scene");
            return None;
        }

        let survivors: Vec<usize> = (0..eligible.len())
            .filter(|&i| rng.gen::<f64>() <= eligible[i].probability)
            .collect();
        let fired_index = match pick(rng, &survivors) {
            Some(&i) => i,
            None => highest_probability(&eligible),
        };
        let fired = eligible.remove(fired_index);

        for deferred in eligible {
            let item = QueuedScene {
                kind: deferred.kind,
                location: deferred.location,
                summary: deferred.summary,
                participants: vec![initiator.name.clone(), target.name.clone()],
                ready_at: now.plus_minutes(self.queue_delay(rng)),
            };
            tracing::debug!(kind = %item.kind, ready_at = %item.ready_at, "scene deferred");
            target.state.enqueue(item.clone());
            initiator.state.enqueue(item);
        }

        tracing::debug!(kind = %fired.kind, location = %fired.location, "scene fired");
        Some(self.fire(fired.kind, &fired.location, &fired.summary, initiator, target))
    }

    /// Writes `event` into the character's memory as something they took part in.
    pub fn add_scene_memory<M: MemoryStore>(&self, character: &mut Character<M>, event: &SceneEvent) -> RecordId {
        let description = self.filter.sanitize(&event.to_memory_description());
        let mut keywords: Vec<String> = Vec::new();
        let fixed = [SCENE_KEYWORD, event.kind().label(), event.location()];
        for keyword in fixed.into_iter().chain(event.participants().iter().map(String::as_str)) {
            if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
                keywords.push(keyword.to_string());
            }
        }

        let entry = EventEntry {
            created: character.now(),
            subject: None,
            actor: character.name.clone(),
            predicate: "experience".to_string(),
            object: "scene".to_string(),
            keywords,
            importance: self.memory.importance,
            embedding: self.embedder.embed(&description),
            description,
            extra: None,
        };
        character.memory.add_event(entry)
    }

    /// Removes one ready queued scene shared with `target` from both queues.
    fn take_ready<R, A, B>(
        &self,
        rng: &mut R,
        initiator: &mut Character<A>,
        target: &mut Character<B>,
    ) -> Option<QueuedScene>
    where
        R: Rng + ?Sized,
    {
        let ready: Vec<&QueuedScene> = initiator.state.ready_with(&target.name).collect();
        let item = pick(rng, &ready).map(|item| (*item).clone())?;
        initiator.state.remove_queued(&item);
        target.state.remove_queued(&item);
        Some(item)
    }

    fn queue_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let (min, max) = (self.config.queue_min_delay, self.config.queue_max_delay);
        if min >= max {
            min
        } else {
            rng.gen_range(min..=max)
        }
    }

    fn fire<A, B>(
        &self,
        kind: SceneKind,
        location: &str,
        summary: &str,
        initiator: &mut Character<A>,
        target: &mut Character<B>,
    ) -> SceneEvent {
        let now = initiator.now();
        initiator.state.stamp_scene(kind, now);
        initiator.state.stamp_pair(&target.name, kind, now);
        target.state.stamp_scene(kind, now);
        target.state.stamp_pair(&initiator.name, kind, now);

        SceneEvent::new(
            kind,
            location,
            vec![initiator.name.clone(), target.name.clone()],
            self.filter.sanitize(summary),
            now,
        )
    }
}

/// Uniform pick; a single item is returned without drawing.
fn pick<'a, R, T>(rng: &mut R, items: &'a [T]) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    match items.len() {
        0 | 1 => items.first(),
        n => items.get(rng.gen_range(0..n)),
    }
}

/// Index of the most probable candidate; the first one wins ties.
fn highest_probability(candidates: &[SceneCandidate]) -> usize {
    let mut best = 0;
    for (i, candidate) in candidates.iter().enumerate().skip(1) {
        if candidate.probability > candidates[best].probability {
            best = i;
        }
    }
    best
}
