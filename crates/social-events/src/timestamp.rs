//! Simulation Time
//!
//! The simulated wall clock shared by characters, rumors and scenes.
//!
//! # Example
//!
//! ```
//! use social_events::SimTime;
//!
//! let t: SimTime = "2024-02-13 13:05:00".parse().unwrap();
//! assert_eq!(t.hour(), 13);
//! assert_eq!(t.plus_minutes(55).to_string(), "2024-02-13 14:00:00");
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed-width rendering used in every stored record.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A point in simulated time, second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(NaiveDateTime);

impl SimTime {
    /// Creates a SimTime from calendar parts. Returns None for impossible dates.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, min, sec)
            .map(Self)
    }

    /// Hour of day, 0..=23.
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Returns this instant shifted by `minutes` (may be negative).
    ///
    /// Shifts past the representable range clamp to its ends.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        match Duration::try_minutes(minutes).and_then(|d| self.0.checked_add_signed(d)) {
            Some(shifted) => Self(shifted),
            None if minutes < 0 => Self(NaiveDateTime::MIN),
            None => Self(NaiveDateTime::MAX),
        }
    }

    /// Seconds elapsed from `earlier` to `self`. Negative if `earlier` is later.
    pub fn seconds_since(&self, earlier: &SimTime) -> i64 {
        (self.0 - earlier.0).num_seconds()
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

/// Error type for parsing SimTime from strings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid time: '{0}', expected 'YYYY-MM-DD HH:MM:SS'")]
pub struct ParseTimeError(pub String);

impl FromStr for SimTime {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map(Self)
            .map_err(|_| ParseTimeError(s.to_string()))
    }
}

// Serialized as the same fixed-width string used in memory records
impl Serialize for SimTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SimTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
