//! Memory Record Types
//!
//! Payloads exchanged with a character's episodic memory store.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::timestamp::SimTime;

/// Handle returned by a memory store for a written record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The text an embedding was computed from, paired with the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub key: String,
    pub vector: Vec<f32>,
}

/// A new event to append to a memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    /// Simulated time the event was recorded
    pub created: SimTime,
    /// Optional subject node; always None for social events
    pub subject: Option<String>,
    /// Character the memory belongs to
    pub actor: String,
    /// Verb, e.g. "heard" or "experience"
    pub predicate: String,
    /// Object type, e.g. "rumor" or "scene"
    pub object: String,
    /// Serialized record text
    pub description: String,
    pub keywords: Vec<String>,
    /// Poignancy on the store's 1-10 scale
    pub importance: u8,
    pub embedding: Embedding,
    /// Optional extra payload; always None for social events
    pub extra: Option<String>,
}

/// An event as held by a memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub entry: EventEntry,
}

impl MemoryRecord {
    pub fn new(entry: EventEntry) -> Self {
        Self {
            id: RecordId::new(),
            entry,
        }
    }

    pub fn description(&self) -> &str {
        &self.entry.description
    }
}
