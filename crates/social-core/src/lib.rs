//! Social heuristics for garden characters: rumors that drift as they are
//! retold, and cooldown-gated scenes with a deferred queue.

pub mod character;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod memory;
pub mod rumor;
pub mod sanitize;
pub mod scene;
pub mod tables;

pub use character::{Character, PairKey, QueuedScene, SocialState};
pub use config::{ConfigError, HourWindow, MemoryConfig, RumorConfig, SceneConfig, SceneWindows, TuningConfig};
pub use embedding::SeedEmbedder;
pub use engine::{InteractionOutcome, SocialEngine};
pub use memory::{latest_rumor, latest_rumor_record, EpisodicMemory, MemoryStore};
pub use rumor::{ActionOverride, RumorEngine};
pub use sanitize::{TextFilter, WorldSanitizer};
pub use scene::{SceneCandidate, SceneEngine};

pub use social_events::{Rumor, SceneEvent, SceneKind, SimTime};
