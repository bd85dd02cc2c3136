//! Character State
//!
//! Per-character runtime state the engines read and update: the clock,
//! scene cooldowns, the deferred scene queue and the rumor influence latch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use social_events::{SceneKind, SimTime};

use crate::memory::{EpisodicMemory, MemoryStore};

/// A simulated character: a name, its transient social state and its memory.
#[derive(Debug, Clone)]
pub struct Character<M = EpisodicMemory> {
    pub name: String,
    pub state: SocialState,
    pub memory: M,
}

impl<M: MemoryStore + Default> Character<M> {
    pub fn new(name: impl Into<String>, now: SimTime) -> Self {
        Self::with_memory(name, now, M::default())
    }
}

impl<M> Character<M> {
    pub fn with_memory(name: impl Into<String>, now: SimTime, memory: M) -> Self {
        Self {
            name: name.into(),
            state: SocialState::new(now),
            memory,
        }
    }

    pub fn now(&self) -> SimTime {
        self.state.curr_time
    }

    /// Moves this character's clock.
    pub fn advance_to(&mut self, now: SimTime) {
        self.state.curr_time = now;
    }
}

/// Key for a cooldown shared by a scene kind and a partner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub kind: SceneKind,
    pub other: String,
}

impl PairKey {
    pub fn new(kind: SceneKind, other: impl Into<String>) -> Self {
        Self {
            kind,
            other: other.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.other)
    }
}

/// A scene that lost the draw and may fire later between the same pair.
///
/// Every queued item lives in both participants' queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedScene {
    pub kind: SceneKind,
    pub location: String,
    pub summary: String,
    pub participants: Vec<String>,
    pub ready_at: SimTime,
}

impl QueuedScene {
    fn same_item(&self, other: &QueuedScene) -> bool {
        self.kind == other.kind
            && self.participants == other.participants
            && self.ready_at == other.ready_at
    }

    pub fn is_ready(&self, now: SimTime) -> bool {
        self.ready_at <= now
    }

    pub fn involves(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p == name)
    }
}

/// Mutable social bookkeeping for one character.
#[derive(Debug, Clone)]
pub struct SocialState {
    /// Current simulated time for this character
    pub curr_time: SimTime,
    /// Last time each scene kind fired for this character
    pub scene_cooldowns: HashMap<SceneKind, SimTime>,
    /// Last time each scene kind fired with each partner
    pub pair_cooldowns: HashMap<PairKey, SimTime>,
    /// Deferred scenes, oldest first
    pub scene_queue: Vec<QueuedScene>,
    /// Set once a rumor has redirected this character's plans
    pub rumor_influence_done: bool,
}

impl SocialState {
    pub fn new(now: SimTime) -> Self {
        Self {
            curr_time: now,
            scene_cooldowns: HashMap::new(),
            pair_cooldowns: HashMap::new(),
            scene_queue: Vec::new(),
            rumor_influence_done: false,
        }
    }

    fn elapsed(&self, last_seen: Option<&SimTime>, minutes: i64) -> bool {
        match last_seen {
            None => true,
            Some(last) => self.curr_time.seconds_since(last) >= minutes.saturating_mul(60),
        }
    }

    /// Whether `kind` is off cooldown for this character.
    pub fn scene_cooldown_ok(&self, kind: SceneKind, minutes: i64) -> bool {
        self.elapsed(self.scene_cooldowns.get(&kind), minutes)
    }

    /// Whether `kind` is off cooldown for this character with `other`.
    pub fn pair_cooldown_ok(&self, other: &str, kind: SceneKind, minutes: i64) -> bool {
        self.elapsed(self.pair_cooldowns.get(&PairKey::new(kind, other)), minutes)
    }

    pub fn scene_last_seen(&self, kind: SceneKind) -> Option<SimTime> {
        self.scene_cooldowns.get(&kind).copied()
    }

    /// Records that `kind` fired at `at`.
    pub fn stamp_scene(&mut self, kind: SceneKind, at: SimTime) {
        self.scene_cooldowns.insert(kind, at);
    }

    /// Records that `kind` fired with `other` at `at`.
    pub fn stamp_pair(&mut self, other: &str, kind: SceneKind, at: SimTime) {
        self.pair_cooldowns.insert(PairKey::new(kind, other), at);
    }

    pub fn enqueue(&mut self, item: QueuedScene) {
        self.scene_queue.push(item);
    }

    /// Queued scenes that are ready now and involve `other`.
    pub fn ready_with<'a>(&'a self, other: &'a str) -> impl Iterator<Item = &'a QueuedScene> + 'a {
        let now = self.curr_time;
        self.scene_queue
            .iter()
            .filter(move |item| item.is_ready(now) && item.involves(other))
    }

    /// Removes every copy of `item` from the queue.
    pub fn remove_queued(&mut self, item: &QueuedScene) {
        self.scene_queue.retain(|q| !q.same_item(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> SimTime {
        s.parse().unwrap()
    }

    fn queued(kind: SceneKind, ready_at: &str) -> QueuedScene {
        QueuedScene {
            kind,
            location: "正厅".to_string(),
            summary: "在正厅小聚用膳".to_string(),
            participants: vec!["宝玉".to_string(), "宝钗".to_string()],
            ready_at: at(ready_at),
        }
    }

    #[test]
    fn test_new_state_has_no_cooldowns() {
        let state = SocialState::new(at("2024-02-13 12:00:00"));
        for kind in SceneKind::all() {
            assert!(state.scene_cooldown_ok(*kind, 90));
            assert!(state.pair_cooldown_ok("宝钗", *kind, 50));
        }
        assert!(state.scene_queue.is_empty());
        assert!(!state.rumor_influence_done);
    }

    #[test]
    fn test_scene_cooldown_boundary() {
        let mut state = SocialState::new(at("2024-02-13 12:00:00"));
        state.stamp_scene(SceneKind::Poetry, state.curr_time);
        assert_eq!(state.scene_last_seen(SceneKind::Poetry), Some(at("2024-02-13 12:00:00")));

        state.curr_time = at("2024-02-13 13:29:59");
        assert!(!state.scene_cooldown_ok(SceneKind::Poetry, 90));
        state.curr_time = at("2024-02-13 13:30:00");
        assert!(state.scene_cooldown_ok(SceneKind::Poetry, 90));
        assert!(state.scene_cooldown_ok(SceneKind::FamilyMeal, 90));
    }

    #[test]
    fn test_pair_cooldown_is_per_partner() {
        let mut state = SocialState::new(at("2024-02-13 12:00:00"));
        state.stamp_pair("宝钗", SceneKind::FamilyMeal, at("2024-02-13 12:00:00"));
        state.curr_time = at("2024-02-13 12:20:00");
        assert!(!state.pair_cooldown_ok("宝钗", SceneKind::FamilyMeal, 50));
        assert!(state.pair_cooldown_ok("黛玉", SceneKind::FamilyMeal, 50));
        assert!(state.pair_cooldown_ok("宝钗", SceneKind::Poetry, 50));
    }

    #[test]
    fn test_huge_cooldown_never_elapses() {
        let mut state = SocialState::new(at("2024-02-13 12:00:00"));
        state.stamp_scene(SceneKind::Poetry, at("2024-02-13 12:00:00"));
        state.stamp_pair("宝钗", SceneKind::Poetry, at("2024-02-13 12:00:00"));
        state.curr_time = at("2124-02-13 12:00:00");
        assert!(!state.scene_cooldown_ok(SceneKind::Poetry, i64::MAX));
        assert!(!state.pair_cooldown_ok("宝钗", SceneKind::Poetry, i64::MAX));
        assert!(state.scene_cooldown_ok(SceneKind::FamilyMeal, i64::MAX));
    }

    #[test]
    fn test_pair_key_display() {
        assert_eq!(PairKey::new(SceneKind::SickVisit, "黛玉").to_string(), "探病:黛玉");
    }

    #[test]
    fn test_ready_with_filters_time_and_partner() {
        let mut state = SocialState::new(at("2024-02-13 12:15:00"));
        state.enqueue(queued(SceneKind::FamilyMeal, "2024-02-13 12:10:00"));
        state.enqueue(queued(SceneKind::Poetry, "2024-02-13 12:30:00"));

        let ready: Vec<_> = state.ready_with("宝钗").map(|q| q.kind).collect();
        assert_eq!(ready, vec![SceneKind::FamilyMeal]);
        assert_eq!(state.ready_with("黛玉").count(), 0);
    }

    #[test]
    fn test_remove_queued_matches_identity_fields() {
        let mut state = SocialState::new(at("2024-02-13 12:15:00"));
        let item = queued(SceneKind::FamilyMeal, "2024-02-13 12:10:00");
        state.enqueue(item.clone());
        state.enqueue(queued(SceneKind::FamilyMeal, "2024-02-13 12:40:00"));

        let mut lookalike = item.clone();
        lookalike.summary = "different text".to_string();
        state.remove_queued(&lookalike);

        assert_eq!(state.scene_queue.len(), 1);
        assert_eq!(state.scene_queue[0].ready_at, at("2024-02-13 12:40:00"));
    }

    #[test]
    fn test_queued_scene_serde_shape() {
        let item = queued(SceneKind::FamilyMeal, "2024-02-13 12:10:00");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "family_meal");
        assert_eq!(json["ready_at"], "2024-02-13 12:10:00");
        let back: QueuedScene = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_character_clock() {
        let mut character: Character = Character::new("黛玉", at("2024-02-13 07:00:00"));
        character.advance_to(at("2024-02-13 08:00:00"));
        assert_eq!(character.now(), at("2024-02-13 08:00:00"));
        assert!(character.memory.is_empty());
    }
}
