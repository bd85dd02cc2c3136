//! Scene Records
//!
//! Scene kinds, the scene event value type and its memory record format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::timestamp::SimTime;

/// Leading marker that identifies a scene record.
pub const SCENE_MARKER: &str = "【场景】";

const FIELD_SEPARATOR: char = '｜';

/// Kind of shared social vignette.
///
/// Serialized by its snake_case name (used in tuning files); displayed and
/// stored in memory records by its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// 探病: visiting someone who is unwell
    SickVisit,
    /// 诗社: poetry gathering
    Poetry,
    /// 家宴: family meal
    FamilyMeal,
    /// 夜谈: late night conversation
    NightTalk,
}

impl SceneKind {
    /// Label written into memory records.
    pub fn label(self) -> &'static str {
        match self {
            SceneKind::SickVisit => "探病",
            SceneKind::Poetry => "诗社",
            SceneKind::FamilyMeal => "家宴",
            SceneKind::NightTalk => "夜谈",
        }
    }

    /// Name used in tuning files.
    pub fn key(self) -> &'static str {
        match self {
            SceneKind::SickVisit => "sick_visit",
            SceneKind::Poetry => "poetry",
            SceneKind::FamilyMeal => "family_meal",
            SceneKind::NightTalk => "night_talk",
        }
    }

    /// Returns all scene kinds in evaluation order.
    pub fn all() -> &'static [SceneKind] {
        &[
            SceneKind::SickVisit,
            SceneKind::Poetry,
            SceneKind::FamilyMeal,
            SceneKind::NightTalk,
        ]
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error type for parsing a SceneKind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown scene kind: '{0}'")]
pub struct ParseSceneKindError(pub String);

impl FromStr for SceneKind {
    type Err = ParseSceneKindError;

    /// Accepts either the label or the tuning-file name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SceneKind::all()
            .iter()
            .copied()
            .find(|kind| kind.label() == s || kind.key() == s)
            .ok_or_else(|| ParseSceneKindError(s.to_string()))
    }
}

/// A scene that fired between two characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEvent {
    kind: SceneKind,
    location: String,
    participants: Vec<String>,
    summary: String,
    timestamp: SimTime,
}

impl SceneEvent {
    pub fn new(
        kind: SceneKind,
        location: impl Into<String>,
        participants: Vec<String>,
        summary: impl Into<String>,
        timestamp: SimTime,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            participants,
            summary: summary.into(),
            timestamp,
        }
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn timestamp(&self) -> SimTime {
        self.timestamp
    }

    /// Renders the scene as a memory record description.
    pub fn to_memory_description(&self) -> String {
        let sep = FIELD_SEPARATOR;
        format!(
            "{SCENE_MARKER}type={kind}{sep}loc={loc}{sep}with={people}{sep}summary={summary}{sep}ts={ts}",
            kind = self.kind.label(),
            loc = self.location,
            people = self.participants.join(","),
            summary = self.summary,
            ts = self.timestamp,
        )
    }

    /// Parses a record written by [`SceneEvent::to_memory_description`].
    ///
    /// Returns None for non-scene text, an unknown kind or a bad timestamp.
    pub fn from_memory_description(description: &str) -> Option<Self> {
        let body = description.strip_prefix(SCENE_MARKER)?;
        let fields: HashMap<&str, &str> = body
            .split(FIELD_SEPARATOR)
            .filter_map(|part| part.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let kind = fields.get("type")?.parse().ok()?;
        let timestamp = fields.get("ts")?.parse().ok()?;
        let participants = fields
            .get("with")
            .map(|raw| {
                raw.split(',')
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            kind,
            location: fields.get("loc").copied().unwrap_or_default().to_string(),
            participants,
            summary: fields.get("summary").copied().unwrap_or_default().to_string(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> SimTime {
        "2024-02-13 12:30:00".parse().unwrap()
    }

    #[test]
    fn test_kind_labels_parse_back() {
        for kind in SceneKind::all() {
            assert_eq!(kind.label().parse::<SceneKind>().unwrap(), *kind);
            assert_eq!(kind.key().parse::<SceneKind>().unwrap(), *kind);
        }
        assert!("赏花".parse::<SceneKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_by_key() {
        assert_eq!(serde_json::to_string(&SceneKind::FamilyMeal).unwrap(), r#""family_meal""#);
        assert_eq!(SceneKind::SickVisit.to_string(), "探病");
    }

    #[test]
    fn test_description_layout() {
        let event = SceneEvent::new(
            SceneKind::FamilyMeal,
            "正厅",
            vec!["宝玉".to_string(), "宝钗".to_string()],
            "在正厅小聚用膳",
            noon(),
        );
        assert_eq!(
            event.to_memory_description(),
            "【场景】type=家宴｜loc=正厅｜with=宝玉,宝钗｜summary=在正厅小聚用膳｜ts=2024-02-13 12:30:00"
        );
    }

    #[test]
    fn test_description_parses_back() {
        let event = SceneEvent::new(
            SceneKind::NightTalk,
            "怡红院",
            vec!["宝玉".to_string(), "黛玉".to_string()],
            "夜里在怡红院低声交谈",
            noon(),
        );
        let parsed = SceneEvent::from_memory_description(&event.to_memory_description());
        assert_eq!(parsed, Some(event));
    }

    #[test]
    fn test_bad_scene_records() {
        assert!(SceneEvent::from_memory_description("【流言】听闻x").is_none());
        assert!(SceneEvent::from_memory_description("【场景】type=赏花｜ts=2024-02-13 12:30:00").is_none());
        assert!(SceneEvent::from_memory_description("【场景】type=家宴｜ts=noon").is_none());
    }
}
