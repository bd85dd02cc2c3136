//! Shared social event types and record formats.
//!
//! This crate contains pure data structures and the text record codecs,
//! with no engine logic. It is a dependency for the engine crate.

pub mod memory;
pub mod rumor;
pub mod scene;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{ParseTimeError, SimTime, TIME_FORMAT};

// Re-export rumor types
pub use rumor::{
    is_rumor_record, parse_memory_description, round_credibility, to_memory_description, Rumor,
    DEFAULT_CREDIBILITY, RUMOR_MARKER, RUMOR_PREFIX,
};

// Re-export scene types
pub use scene::{ParseSceneKindError, SceneEvent, SceneKind, SCENE_MARKER};

// Re-export memory payloads
pub use memory::{Embedding, EventEntry, MemoryRecord, RecordId};
