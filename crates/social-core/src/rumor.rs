//! Rumor Engine
//!
//! Rumors are born from conversations, drift a little each time they are
//! retold, lose credibility as they drift, and can pull a character toward
//! the place they name.

use rand::Rng;
use std::sync::Arc;

use social_events::{EventEntry, RecordId, Rumor};

use crate::character::Character;
use crate::config::{MemoryConfig, RumorConfig};
use crate::embedding::SeedEmbedder;
use crate::memory::{latest_rumor, MemoryStore};
use crate::sanitize::TextFilter;
use crate::tables::{first_alias_in, rumor_alias, trigger_boost, triggers_in};

/// Boilerplate that conversation summaries often start with.
const SUMMARY_PREFIX: &str = "conversing about";

/// Topic used when a summary is not in the garden's script.
const GENERIC_TOPIC: &str = "园中诗话";

/// Topic used when a summary is empty.
const DEFAULT_TOPIC: &str = "园中近来逸事";

/// Keywords attached to every rumor record.
const RUMOR_KEYWORDS: &[&str] = &["流言", "听闻"];

/// An action a rumor talked a character into.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOverride {
    /// The rumor that prompted the change of plan
    pub rumor: Rumor,
    pub act_description: String,
    pub act_duration: u32,
}

/// Creates, distorts and relays rumors between characters.
pub struct RumorEngine {
    config: RumorConfig,
    memory: MemoryConfig,
    filter: Arc<dyn TextFilter>,
    embedder: SeedEmbedder,
}

impl RumorEngine {
    pub fn new(config: RumorConfig, memory: MemoryConfig, filter: Arc<dyn TextFilter>) -> Self {
        let embedder = SeedEmbedder::new(memory.embedding_dim);
        Self {
            config,
            memory,
            filter,
            embedder,
        }
    }

    pub fn config(&self) -> &RumorConfig {
        &self.config
    }

    /// Chance that a conversation with this summary produces a rumor.
    pub fn birth_probability(&self, summary: &str) -> f64 {
        (self.config.birth_probability + trigger_boost(summary, self.config.trigger_boost)).min(1.0)
    }

    /// Chance that a speaker passes this rumor on.
    pub fn spread_probability(&self, rumor: &Rumor) -> f64 {
        (self.config.spread_base + trigger_boost(rumor.content(), self.config.trigger_boost))
            .min(self.config.spread_cap)
    }

    /// Possibly turns a conversation between `initiator` and `target` at
    /// `location` into a new rumor.
    pub fn maybe_generate_rumor<R, A, B>(
        &self,
        rng: &mut R,
        initiator: &Character<A>,
        target: &Character<B>,
        location: &str,
        summary: &str,
    ) -> Option<Rumor>
    where
        R: Rng + ?Sized,
    {
        let probability = self.birth_probability(summary);
        if rng.gen::<f64>() > probability {
            tracing::trace!(initiator = %initiator.name, probability, "no rumor born");
            return None;
        }

        let content = self.filter.sanitize(&format!(
            "{}与{}在{}似乎提到{}",
            initiator.name,
            target.name,
            location_phrase(location),
            extract_topic(summary)
        ));
        let credibility = (self.config.initial_credibility
            - trigger_boost(&content, self.config.trigger_boost))
        .max(self.config.min_initial_credibility);

        let rumor = Rumor::new(
            content,
            initiator.name.clone(),
            credibility,
            0,
            vec![initiator.name.clone(), target.name.clone()],
            initiator.now().to_string(),
        );
        tracing::debug!(origin = %rumor.origin(), credibility = rumor.credibility(), "rumor born");
        Some(rumor)
    }

    /// Retelling step: usually distorts the rumor once, sometimes leaves it be.
    pub fn maybe_mutate_rumor<R>(&self, rng: &mut R, rumor: &Rumor) -> Rumor
    where
        R: Rng + ?Sized,
    {
        if rng.gen::<f64>() > self.config.mutation_probability {
            return rumor.with_content(self.filter.sanitize(rumor.content()));
        }

        let content = self.filter.sanitize(&distort(rumor.content()));
        let mutated = rumor.mutated(
            content,
            self.config.mutation_penalty,
            self.config.credibility_floor,
        );
        tracing::debug!(
            mutation_count = mutated.mutation_count(),
            credibility = mutated.credibility(),
            "rumor mutated"
        );
        mutated
    }

    /// Writes `rumor` into the character's memory as something they heard.
    pub fn add_rumor_memory<M: MemoryStore>(&self, character: &mut Character<M>, rumor: &Rumor) -> RecordId {
        let description = self.filter.sanitize(&rumor.to_memory_description());
        let entry = EventEntry {
            created: character.now(),
            subject: None,
            actor: character.name.clone(),
            predicate: "heard".to_string(),
            object: "rumor".to_string(),
            keywords: rumor_keywords(rumor.content()),
            importance: self.memory.importance,
            embedding: self.embedder.embed(&description),
            description,
            extra: None,
        };
        character.memory.add_event(entry)
    }

    /// The speaker may pass their latest rumor to the listener.
    ///
    /// Returns the (possibly distorted) rumor the listener now remembers.
    pub fn maybe_spread_rumor<R, S, L>(
        &self,
        rng: &mut R,
        speaker: &Character<S>,
        listener: &mut Character<L>,
    ) -> Option<Rumor>
    where
        R: Rng + ?Sized,
        S: MemoryStore,
        L: MemoryStore,
    {
        let rumor = latest_rumor(&speaker.memory)?;
        let probability = self.spread_probability(&rumor);
        if rng.gen::<f64>() > probability {
            tracing::trace!(speaker = %speaker.name, probability, "rumor kept to self");
            return None;
        }
        Some(self.relay(rng, &rumor, speaker, listener))
    }

    /// Passes `rumor` to the listener with no spread gate.
    pub fn spread_rumor_to_listener<R, S, L>(
        &self,
        rng: &mut R,
        rumor: &Rumor,
        speaker: &Character<S>,
        listener: &mut Character<L>,
    ) -> Rumor
    where
        R: Rng + ?Sized,
        L: MemoryStore,
    {
        self.relay(rng, rumor, speaker, listener)
    }

    fn relay<R, S, L>(
        &self,
        rng: &mut R,
        rumor: &Rumor,
        speaker: &Character<S>,
        listener: &mut Character<L>,
    ) -> Rumor
    where
        R: Rng + ?Sized,
        L: MemoryStore,
    {
        let mutated = self.maybe_mutate_rumor(rng, rumor);
        let heard = mutated.with_content(self.filter.sanitize(mutated.content()));
        self.add_rumor_memory(listener, &heard);
        tracing::debug!(
            speaker = %speaker.name,
            listener = %listener.name,
            mutation_count = heard.mutation_count(),
            "rumor relayed"
        );
        heard
    }

    /// Lets the character's latest rumor redirect their next action, once.
    ///
    /// When the rumor names a known place, the planned action is replaced
    /// by a visit there and its duration capped. The character's influence
    /// latch is set so later calls return None.
    pub fn maybe_influence_action<M: MemoryStore>(
        &self,
        character: &mut Character<M>,
        planned_action: &str,
        planned_duration: u32,
    ) -> Option<ActionOverride> {
        if character.state.rumor_influence_done {
            return None;
        }
        let rumor = latest_rumor(&character.memory)?;
        let (alias, location) = first_alias_in(rumor.content())?;

        let act_description = self.filter.sanitize(&format!("去{alias}（{location}）看看传闻的来处"));
        let act_duration = planned_duration.min(self.config.influence_max_duration);
        character.state.rumor_influence_done = true;
        tracing::debug!(
            character = %character.name,
            planned = planned_action,
            redirected = %act_description,
            "rumor changed plans"
        );
        Some(ActionOverride {
            rumor,
            act_description,
            act_duration,
        })
    }
}

/// Topic a rumor claims was discussed, from a conversation summary.
pub fn extract_topic(summary: &str) -> String {
    let mut topic = summary.trim();
    if let Some(rest) = topic.strip_prefix(SUMMARY_PREFIX) {
        topic = rest.trim();
    }
    if topic.chars().any(|c| c.is_ascii_alphabetic()) {
        return GENERIC_TOPIC.to_string();
    }
    if topic.is_empty() {
        return DEFAULT_TOPIC.to_string();
    }
    topic.to_string()
}

/// `alias（canonical）` for known locations, the location itself otherwise.
pub fn location_phrase(location: &str) -> String {
    match rumor_alias(location) {
        Some(alias) => format!("{alias}（{location}）"),
        None => location.to_string(),
    }
}

/// One distortion step, first applicable rule wins:
/// hearsay becomes "it is said", an unhedged claim gets hedged, a hedge
/// gets stronger.
pub fn distort(content: &str) -> String {
    if content.contains("听闻") {
        return content.replacen("听闻", "据说", 1);
    }
    if !content.contains("似乎") && !content.contains("好像") {
        return content.replacen('在', "似乎在", 1);
    }
    content.replacen("似乎", "仿佛", 1)
}

/// Trigger keywords, content tokens of two or more characters, and the
/// fixed rumor tags, without duplicates.
pub fn rumor_keywords(content: &str) -> Vec<String> {
    let tokens = content
        .split(|c: char| matches!(c, '，' | '。' | '；' | '：' | '、') || c.is_whitespace())
        .map(str::trim)
        .filter(|token| token.chars().count() >= 2);

    let mut keywords: Vec<String> = Vec::new();
    let mut push = |keyword: &str| {
        if !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    };
    triggers_in(content).for_each(&mut push);
    tokens.for_each(&mut push);
    RUMOR_KEYWORDS.iter().copied().for_each(&mut push);
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuningConfig;
    use crate::memory::EpisodicMemory;
    use crate::sanitize::WorldSanitizer;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use social_events::SimTime;

    /// Every draw is 0.0: all gates pass.
    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Every draw is just below 1.0: every gate below certainty fails.
    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn engine_with(config: RumorConfig) -> RumorEngine {
        RumorEngine::new(config, MemoryConfig::default(), Arc::new(WorldSanitizer::new()))
    }

    fn engine() -> RumorEngine {
        engine_with(TuningConfig::default().rumor)
    }

    fn now() -> SimTime {
        "2024-02-13 13:00:00".parse().unwrap()
    }

    fn character(name: &str) -> Character {
        Character::new(name, now())
    }

    fn sample_rumor(credibility: f64) -> Rumor {
        Rumor::new(
            "黛玉与宝玉在潇湘馆似乎提到诗",
            "黛玉",
            credibility,
            0,
            vec!["黛玉".to_string(), "宝玉".to_string()],
            "2024-02-13 13:00:00",
        )
    }

    #[test]
    fn test_extract_topic() {
        assert_eq!(extract_topic("conversing about 诗会"), "诗会");
        assert_eq!(extract_topic("conversing about the weather"), GENERIC_TOPIC);
        assert_eq!(extract_topic("谈论Keats"), GENERIC_TOPIC);
        assert_eq!(extract_topic("   "), DEFAULT_TOPIC);
        assert_eq!(extract_topic("conversing about"), DEFAULT_TOPIC);
    }

    #[test]
    fn test_location_phrase() {
        assert_eq!(location_phrase("Johnson Park"), "沁芳亭（Johnson Park）");
        assert_eq!(location_phrase("Hobbs Cafe"), "Hobbs Cafe");
    }

    #[test]
    fn test_distort_rule_order() {
        assert_eq!(distort("听闻宝玉在沁芳亭听闻"), "据说宝玉在沁芳亭听闻");
        assert_eq!(distort("宝玉在沁芳亭在读书"), "宝玉似乎在沁芳亭在读书");
        assert_eq!(distort("宝玉似乎在沁芳亭似乎"), "宝玉仿佛在沁芳亭似乎");
        assert_eq!(distort("宝玉好像在沁芳亭"), "宝玉好像在沁芳亭");
    }

    #[test]
    fn test_rumor_keywords() {
        let keywords = rumor_keywords("黛玉与宝玉在潇湘馆似乎提到诗，夜 深了");
        assert_eq!(
            keywords,
            vec!["潇湘馆", "宝玉", "黛玉", "黛玉与宝玉在潇湘馆似乎提到诗", "深了", "流言", "听闻"]
        );
    }

    #[test]
    fn test_generate_rumor() {
        let engine = engine();
        let a = character("黛玉");
        let b = character("宝玉");
        let rumor = engine
            .maybe_generate_rumor(&mut always(), &a, &b, "Dorm for Oak Hill College", "conversing about poems")
            .unwrap();

        assert_eq!(rumor.content(), "黛玉与宝玉在潇湘馆似乎提到园中诗话");
        assert_eq!(rumor.origin(), "黛玉");
        assert_eq!(rumor.targets(), &["黛玉".to_string(), "宝玉".to_string()]);
        assert_eq!(rumor.timestamp(), "2024-02-13 13:00:00");
        assert_eq!(rumor.mutation_count(), 0);
        // three triggers in the content: 潇湘馆, 宝玉, 黛玉
        assert!((rumor.credibility() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_generate_credibility_floor() {
        let engine = engine_with(RumorConfig {
            trigger_boost: 0.1,
            ..RumorConfig::default()
        });
        let a = character("宝玉黛玉宝钗");
        let b = character("沁芳亭怡红院蘅芜苑稻香村");
        let rumor = engine
            .maybe_generate_rumor(&mut always(), &a, &b, "Dorm for Oak Hill College", "")
            .unwrap();
        assert_eq!(rumor.credibility(), 0.3);
    }

    #[test]
    fn test_birth_probability_is_clamped() {
        let every_trigger = "沁芳亭潇湘馆怡红院蘅芜苑稻香村宝玉黛玉宝钗";
        assert_eq!(engine().birth_probability(every_trigger), 1.0);

        let engine = engine_with(RumorConfig {
            birth_probability: 0.9,
            ..RumorConfig::default()
        });
        assert_eq!(engine.birth_probability(every_trigger), 1.0);
        assert!((engine.birth_probability("宝玉") - 0.95).abs() < 1e-9);

        // certainty still holds for the highest possible draw
        let a = character("黛玉");
        let b = character("宝玉");
        assert!(engine.maybe_generate_rumor(&mut never(), &a, &b, "here", every_trigger).is_some());
    }

    #[test]
    fn test_generate_gate_can_fail() {
        let engine = engine_with(RumorConfig {
            birth_probability: 0.2,
            ..RumorConfig::default()
        });
        let a = character("袭人");
        let b = character("晴雯");
        assert!(engine.maybe_generate_rumor(&mut never(), &a, &b, "here", "闲聊").is_none());
    }

    #[test]
    fn test_forced_mutation_lowers_credibility() {
        let engine = engine();
        let rumor = sample_rumor(0.8);
        let mutated = engine.maybe_mutate_rumor(&mut always(), &rumor);

        assert_eq!(mutated.content(), "黛玉与宝玉在潇湘馆仿佛提到诗");
        assert!(mutated.credibility() <= rumor.credibility());
        assert_eq!(mutated.credibility(), 0.7);
        assert_eq!(mutated.mutation_count(), rumor.mutation_count() + 1);
        assert_eq!(mutated.origin(), rumor.origin());
        assert_eq!(mutated.targets(), rumor.targets());
    }

    #[test]
    fn test_five_mutations_reach_point_three() {
        let engine = engine();
        let mut rumor = sample_rumor(0.8);
        for _ in 0..5 {
            rumor = engine.maybe_mutate_rumor(&mut always(), &rumor);
        }
        assert_eq!(rumor.credibility(), 0.3);
        assert_eq!(rumor.mutation_count(), 5);
    }

    #[test]
    fn test_credibility_never_below_floor() {
        let engine = engine();
        let mut rumor = sample_rumor(0.3);
        for _ in 0..10 {
            let next = engine.maybe_mutate_rumor(&mut always(), &rumor);
            assert!(next.credibility() <= rumor.credibility());
            rumor = next;
        }
        assert_eq!(rumor.credibility(), 0.1);
        assert_eq!(rumor.mutation_count(), 10);
    }

    #[test]
    fn test_unmutated_branch_keeps_rumor() {
        let rumor = sample_rumor(0.8);
        assert_eq!(engine().maybe_mutate_rumor(&mut never(), &rumor), rumor);
    }

    #[test]
    fn test_mutation_rate_is_roughly_ninety_percent() {
        let engine = engine();
        let rumor = sample_rumor(0.8);
        let mut rng = SmallRng::seed_from_u64(7);
        let mutated = (0..2000)
            .filter(|_| engine.maybe_mutate_rumor(&mut rng, &rumor).mutation_count() == 1)
            .count();
        assert!((1700..1900).contains(&mutated), "mutated {mutated} of 2000");
    }

    #[test]
    fn test_spread_probability_is_capped() {
        let engine = engine();
        let loud = Rumor::new("沁芳亭潇湘馆怡红院宝玉黛玉宝钗", "x", 0.5, 0, Vec::new(), "");
        assert_eq!(engine.spread_probability(&loud), 0.6);
        let quiet = Rumor::new("有人说了话", "x", 0.5, 0, Vec::new(), "");
        assert!((engine.spread_probability(&quiet) - 0.35).abs() < 1e-9);
        let one = Rumor::new("宝钗说了话", "x", 0.5, 0, Vec::new(), "");
        assert!((engine.spread_probability(&one) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_add_rumor_memory() {
        let engine = engine();
        let mut listener = character("宝钗");
        let rumor = sample_rumor(0.8);
        let id = engine.add_rumor_memory(&mut listener, &rumor);

        let record = listener.memory.get(id).unwrap();
        assert_eq!(record.description(), rumor.to_memory_description());
        assert_eq!(record.entry.actor, "宝钗");
        assert_eq!(record.entry.predicate, "heard");
        assert_eq!(record.entry.object, "rumor");
        assert_eq!(record.entry.importance, 3);
        assert_eq!(record.entry.created, now());
        assert!(record.entry.subject.is_none());
        assert!(record.entry.extra.is_none());
        assert_eq!(record.entry.embedding.key, record.entry.description);
        assert_eq!(record.entry.embedding.vector.len(), 1536);
        assert!(record.entry.keywords.iter().any(|k| k == "流言"));
        assert!(record.entry.keywords.iter().any(|k| k == "潇湘馆"));
    }

    #[test]
    fn test_spread_writes_to_listener() {
        let engine = engine();
        let mut speaker = character("黛玉");
        let mut listener = character("宝钗");
        engine.add_rumor_memory(&mut speaker, &sample_rumor(0.8));

        let heard = engine.maybe_spread_rumor(&mut always(), &speaker, &mut listener).unwrap();
        assert_eq!(heard.mutation_count(), 1);
        assert_eq!(listener.memory.len(), 1);
        assert_eq!(latest_rumor(&listener.memory), Some(heard));
    }

    #[test]
    fn test_spread_uses_most_recent_rumor() {
        let engine = engine();
        let mut speaker = character("黛玉");
        let mut listener = character("宝钗");
        engine.add_rumor_memory(&mut speaker, &Rumor::new("旧事", "x", 0.8, 0, Vec::new(), ""));
        engine.add_rumor_memory(&mut speaker, &Rumor::new("宝玉在沁芳亭", "x", 0.8, 3, Vec::new(), ""));

        let heard = engine.maybe_spread_rumor(&mut always(), &speaker, &mut listener).unwrap();
        assert_eq!(heard.content(), "宝玉似乎在沁芳亭");
        assert_eq!(heard.mutation_count(), 4);
    }

    #[test]
    fn test_spread_without_rumor_is_none() {
        let engine = engine();
        let speaker = character("黛玉");
        let mut listener = character("宝钗");
        assert!(engine.maybe_spread_rumor(&mut always(), &speaker, &mut listener).is_none());
        assert!(listener.memory.is_empty());
    }

    #[test]
    fn test_spread_gate_failure_writes_nothing() {
        let engine = engine();
        let mut speaker = character("黛玉");
        let mut listener = character("宝钗");
        engine.add_rumor_memory(&mut speaker, &sample_rumor(0.8));
        assert!(engine.maybe_spread_rumor(&mut never(), &speaker, &mut listener).is_none());
        assert!(listener.memory.is_empty());
    }

    #[test]
    fn test_spread_to_listener_is_unconditional() {
        let engine = engine();
        let speaker = character("黛玉");
        let mut listener: Character<EpisodicMemory> = character("宝钗");
        let rumor = sample_rumor(0.8);

        let heard = engine.spread_rumor_to_listener(&mut never(), &rumor, &speaker, &mut listener);
        assert_eq!(heard, rumor);
        assert_eq!(latest_rumor(&listener.memory), Some(rumor));
    }

    #[test]
    fn test_influence_is_one_shot() {
        let engine = engine();
        let mut character = character("宝钗");
        engine.add_rumor_memory(&mut character, &sample_rumor(0.8));

        let first = engine.maybe_influence_action(&mut character, "reading", 45).unwrap();
        assert_eq!(first.act_description, "去潇湘馆看看传闻的来处");
        assert_eq!(first.act_duration, 30);
        assert_eq!(first.rumor, sample_rumor(0.8));
        assert!(character.state.rumor_influence_done);

        assert!(engine.maybe_influence_action(&mut character, "reading", 45).is_none());
    }

    #[test]
    fn test_influence_keeps_short_duration() {
        let engine = engine();
        let mut character = character("宝钗");
        engine.add_rumor_memory(&mut character, &sample_rumor(0.8));
        let result = engine.maybe_influence_action(&mut character, "reading", 20).unwrap();
        assert_eq!(result.act_duration, 20);
    }

    #[test]
    fn test_influence_needs_a_known_place() {
        let engine = engine();
        let mut character = character("宝钗");
        assert!(engine.maybe_influence_action(&mut character, "reading", 45).is_none());

        engine.add_rumor_memory(&mut character, &Rumor::new("有人在后院说话", "x", 0.8, 0, Vec::new(), ""));
        assert!(engine.maybe_influence_action(&mut character, "reading", 45).is_none());
        assert!(!character.state.rumor_influence_done);
    }
}
