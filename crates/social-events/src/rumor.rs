//! Rumor Records
//!
//! The rumor value type and its single-line memory record format.
//!
//! A stored rumor looks like:
//!
//! ```text
//! 【流言】听闻黛玉与宝玉在潇湘馆似乎提到诗｜origin=黛玉｜cred=0.70｜mut=1｜targets=黛玉,宝玉｜ts=2024-02-13 13:00:00
//! ```
//!
//! Other code paths re-read these records, so the layout is a compatibility
//! contract: marker, content, then `｜`-separated `key=value` fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Leading marker that identifies a rumor record.
pub const RUMOR_MARKER: &str = "【流言】";

/// Marker plus the hearsay phrase that precedes the content.
pub const RUMOR_PREFIX: &str = "【流言】听闻";

/// Separator between record fields (full-width bar).
pub const FIELD_SEPARATOR: char = '｜';

/// Credibility used when a record carries no `cred` field.
pub const DEFAULT_CREDIBILITY: f64 = 0.5;

/// Rounds a credibility to the two decimals the record format keeps,
/// clamped to [0, 1].
pub fn round_credibility(value: f64) -> f64 {
    (value.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// A piece of hearsay with decaying credibility.
///
/// Values are immutable: every transform returns a new Rumor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    content: String,
    origin: String,
    credibility: f64,
    mutation_count: u32,
    targets: Vec<String>,
    timestamp: String,
}

impl Rumor {
    /// Creates a rumor. Content is trimmed and credibility is rounded to
    /// the precision the record format stores.
    pub fn new(
        content: impl Into<String>,
        origin: impl Into<String>,
        credibility: f64,
        mutation_count: u32,
        targets: Vec<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into().trim().to_string(),
            origin: origin.into(),
            credibility: round_credibility(credibility),
            mutation_count,
            targets,
            timestamp: timestamp.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn credibility(&self) -> f64 {
        self.credibility
    }

    pub fn mutation_count(&self) -> u32 {
        self.mutation_count
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Same rumor with different content.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self::new(
            content,
            self.origin.clone(),
            self.credibility,
            self.mutation_count,
            self.targets.clone(),
            self.timestamp.clone(),
        )
    }

    /// One mutation step: new content, credibility lowered by `penalty`
    /// but not below `floor`, mutation count incremented.
    pub fn mutated(&self, content: impl Into<String>, penalty: f64, floor: f64) -> Self {
        Self::new(
            content,
            self.origin.clone(),
            (self.credibility - penalty).max(floor),
            self.mutation_count + 1,
            self.targets.clone(),
            self.timestamp.clone(),
        )
    }

    /// Renders the rumor as a memory record description.
    pub fn to_memory_description(&self) -> String {
        let sep = FIELD_SEPARATOR;
        format!(
            "{RUMOR_PREFIX}{content}{sep}origin={origin}{sep}cred={cred:.2}{sep}mut={mutation}{sep}targets={targets}{sep}ts={ts}",
            content = self.content,
            origin = self.origin,
            cred = self.credibility,
            mutation = self.mutation_count,
            targets = self.targets.join(","),
            ts = self.timestamp,
        )
    }

    /// Parses a record written by [`Rumor::to_memory_description`].
    ///
    /// Returns None when the text is not a rumor record or a numeric field
    /// is malformed. Missing fields take their defaults.
    pub fn from_memory_description(description: &str) -> Option<Self> {
        if !is_rumor_record(description) {
            return None;
        }

        let mut parts = description.split(FIELD_SEPARATOR);
        let head = parts.next()?;
        let content = head
            .strip_prefix(RUMOR_PREFIX)
            .or_else(|| head.strip_prefix(RUMOR_MARKER))
            .unwrap_or(head)
            .trim();

        let fields: HashMap<&str, &str> = parts
            .filter_map(|part| part.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let credibility = match fields.get("cred") {
            Some(raw) => raw.parse::<f64>().ok().filter(|c| c.is_finite())?,
            None => DEFAULT_CREDIBILITY,
        };
        let mutation_count = match fields.get("mut") {
            Some(raw) => raw.parse::<u32>().ok()?,
            None => 0,
        };
        let targets = fields
            .get("targets")
            .map(|raw| {
                raw.split(',')
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let timestamp = fields.get("ts").copied().unwrap_or_default();
        let origin = fields.get("origin").copied().unwrap_or_default();

        Some(Self::new(
            content,
            origin,
            credibility,
            mutation_count,
            targets,
            timestamp,
        ))
    }
}

/// Checks whether a memory description is a rumor record.
pub fn is_rumor_record(description: &str) -> bool {
    description.starts_with(RUMOR_MARKER)
}

/// Free-function form of [`Rumor::from_memory_description`].
pub fn parse_memory_description(description: &str) -> Option<Rumor> {
    Rumor::from_memory_description(description)
}

/// Free-function form of [`Rumor::to_memory_description`].
pub fn to_memory_description(rumor: &Rumor) -> String {
    rumor.to_memory_description()
}
