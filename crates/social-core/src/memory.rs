//! Memory Stores
//!
//! The seam to a character's episodic memory, plus a simple in-memory
//! implementation.

use std::collections::VecDeque;

use social_events::{is_rumor_record, EventEntry, MemoryRecord, RecordId, Rumor};

/// Append-only episodic memory owned by one character.
pub trait MemoryStore {
    /// Appends an event and returns its handle.
    fn add_event(&mut self, entry: EventEntry) -> RecordId;

    /// Stored records, most recently added first.
    fn events(&self) -> Box<dyn Iterator<Item = &MemoryRecord> + '_>;
}

/// Most recently added rumor record, if any.
pub fn latest_rumor_record<M: MemoryStore + ?Sized>(store: &M) -> Option<&MemoryRecord> {
    store.events().find(|record| is_rumor_record(record.description()))
}

/// Parses the most recently added rumor record.
///
/// Only the newest rumor is considered: if it is malformed, older rumors
/// are not consulted.
pub fn latest_rumor<M: MemoryStore + ?Sized>(store: &M) -> Option<Rumor> {
    latest_rumor_record(store).and_then(|record| Rumor::from_memory_description(record.description()))
}

/// In-memory store keeping records newest first.
#[derive(Debug, Clone, Default)]
pub struct EpisodicMemory {
    records: VecDeque<MemoryRecord>,
}

impl EpisodicMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&MemoryRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Records whose keywords include `keyword`, newest first.
    pub fn with_keyword<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a MemoryRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.entry.keywords.iter().any(|k| k == keyword))
    }
}

impl MemoryStore for EpisodicMemory {
    fn add_event(&mut self, entry: EventEntry) -> RecordId {
        let record = MemoryRecord::new(entry);
        let id = record.id;
        self.records.push_front(record);
        id
    }

    fn events(&self) -> Box<dyn Iterator<Item = &MemoryRecord> + '_> {
        Box::new(self.records.iter())
    }
}
