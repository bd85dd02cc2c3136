//! Configuration System
//!
//! Tuning parameters for the rumor and scene engines, loaded from TOML with
//! optional environment overrides. Every field has a default, so a partial
//! file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use social_events::SceneKind;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "social_tuning.toml";

/// Longest cooldown or queue delay accepted, one year in minutes.
pub const MAX_DURATION_MINUTES: i64 = 365 * 24 * 60;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub scene: SceneConfig,
    pub rumor: RumorConfig,
    pub memory: MemoryConfig,
}

impl TuningConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Loads from `path`, falling back to defaults if the file is missing,
    /// unreadable or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path).and_then(|config| config.validate().map(|_| config)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not load tuning, using defaults");
                Self::default()
            }
        }
    }

    /// Applies `SCENE_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies `SCENE_*` overrides from an arbitrary lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scene = &mut self.scene;
        override_value(&lookup, "SCENE_COOLDOWN_MINUTES", &mut scene.cooldown_minutes)?;
        override_value(&lookup, "SCENE_PAIR_COOLDOWN_MINUTES", &mut scene.pair_cooldown_minutes)?;
        override_value(&lookup, "SCENE_QUEUE_MIN_DELAY", &mut scene.queue_min_delay)?;
        override_value(&lookup, "SCENE_QUEUE_MAX_DELAY", &mut scene.queue_max_delay)?;
        override_value(&lookup, "SCENE_PROB_VISIT", &mut scene.prob_visit)?;
        override_value(&lookup, "SCENE_PROB_POETRY", &mut scene.prob_poetry)?;
        override_value(&lookup, "SCENE_PROB_MEAL", &mut scene.prob_meal)?;
        override_value(&lookup, "SCENE_PROB_NIGHT", &mut scene.prob_night)?;
        Ok(self)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scene = &self.scene;
        let rumor = &self.rumor;
        let probabilities = [
            ("scene.prob_visit", scene.prob_visit),
            ("scene.prob_poetry", scene.prob_poetry),
            ("scene.prob_meal", scene.prob_meal),
            ("scene.prob_night", scene.prob_night),
            ("rumor.birth_probability", rumor.birth_probability),
            ("rumor.mutation_probability", rumor.mutation_probability),
            ("rumor.spread_base", rumor.spread_base),
            ("rumor.spread_cap", rumor.spread_cap),
            ("rumor.initial_credibility", rumor.initial_credibility),
            ("rumor.min_initial_credibility", rumor.min_initial_credibility),
            ("rumor.credibility_floor", rumor.credibility_floor),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!("{name} must be within [0, 1], got {p}")));
            }
        }

        let durations = [
            ("scene.cooldown_minutes", scene.cooldown_minutes),
            ("scene.pair_cooldown_minutes", scene.pair_cooldown_minutes),
            ("scene.queue_min_delay", scene.queue_min_delay),
            ("scene.queue_max_delay", scene.queue_max_delay),
        ];
        for (name, minutes) in durations {
            if !(0..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, {MAX_DURATION_MINUTES}] minutes, got {minutes}"
                )));
            }
        }
        if scene.queue_min_delay > scene.queue_max_delay {
            return Err(ConfigError::Invalid(format!(
                "queue delay range [{}, {}] is empty",
                scene.queue_min_delay, scene.queue_max_delay
            )));
        }
        for kind in SceneKind::all() {
            if let Some(w) = scene.windows.get(*kind).iter().find(|w| w.0 > 24 || w.1 > 24) {
                return Err(ConfigError::Invalid(format!(
                    "{} window [{}, {}] has an hour above 24",
                    kind.key(),
                    w.0,
                    w.1
                )));
            }
        }
        if self.memory.embedding_dim == 0 {
            return Err(ConfigError::Invalid("memory.embedding_dim must be positive".to_string()));
        }
        Ok(())
    }
}

fn override_value<T, F>(lookup: &F, var: &str, slot: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(var) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::EnvOverride {
            var: var.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

/// An hour-of-day range `[start, end]`, both ends inclusive.
/// `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow(pub u32, pub u32);

impl HourWindow {
    pub fn contains(&self, hour: u32) -> bool {
        let HourWindow(start, end) = *self;
        if start <= end {
            start <= hour && hour <= end
        } else {
            hour >= start || hour <= end
        }
    }
}

/// Checks whether any window contains the hour.
pub fn in_window(hour: u32, windows: &[HourWindow]) -> bool {
    windows.iter().any(|w| w.contains(hour))
}

/// Time-of-day windows per scene kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneWindows {
    pub sick_visit: Vec<HourWindow>,
    pub poetry: Vec<HourWindow>,
    pub family_meal: Vec<HourWindow>,
    pub night_talk: Vec<HourWindow>,
}

impl SceneWindows {
    pub fn get(&self, kind: SceneKind) -> &[HourWindow] {
        match kind {
            SceneKind::SickVisit => &self.sick_visit,
            SceneKind::Poetry => &self.poetry,
            SceneKind::FamilyMeal => &self.family_meal,
            SceneKind::NightTalk => &self.night_talk,
        }
    }
}

impl Default for SceneWindows {
    fn default() -> Self {
        Self {
            sick_visit: vec![HourWindow(7, 18)],
            poetry: vec![HourWindow(12, 18)],
            family_meal: vec![HourWindow(11, 14), HourWindow(17, 20)],
            night_talk: vec![HourWindow(20, 24), HourWindow(0, 5)],
        }
    }
}

/// Scene engine parameters. Durations are in simulated minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Minimum gap before a character sees the same scene kind again
    pub cooldown_minutes: i64,
    /// Minimum gap before the same pair shares the same scene kind again
    pub pair_cooldown_minutes: i64,
    /// Lower bound of the delay given to deferred scenes
    pub queue_min_delay: i64,
    /// Upper bound of the delay given to deferred scenes
    pub queue_max_delay: i64,
    pub prob_visit: f64,
    pub prob_poetry: f64,
    pub prob_meal: f64,
    pub prob_night: f64,
    pub windows: SceneWindows,
}

impl SceneConfig {
    /// Base probability configured for a scene kind.
    pub fn base_probability(&self, kind: SceneKind) -> f64 {
        match kind {
            SceneKind::SickVisit => self.prob_visit,
            SceneKind::Poetry => self.prob_poetry,
            SceneKind::FamilyMeal => self.prob_meal,
            SceneKind::NightTalk => self.prob_night,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: 90,
            pair_cooldown_minutes: 50,
            queue_min_delay: 10,
            queue_max_delay: 30,
            prob_visit: 0.5,
            prob_poetry: 0.6,
            prob_meal: 0.55,
            prob_night: 0.6,
            windows: SceneWindows::default(),
        }
    }
}

/// Rumor engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RumorConfig {
    /// Chance a conversation produces a rumor before trigger boosts
    pub birth_probability: f64,
    /// Added per distinct trigger keyword found in the text
    pub trigger_boost: f64,
    /// Credibility of a new rumor before trigger penalties
    pub initial_credibility: f64,
    /// Lowest credibility a new rumor can start with
    pub min_initial_credibility: f64,
    /// Chance a relayed rumor is distorted
    pub mutation_probability: f64,
    /// Credibility lost per distortion
    pub mutation_penalty: f64,
    /// Credibility never drops below this through distortion
    pub credibility_floor: f64,
    /// Chance a speaker passes on their latest rumor, before boosts
    pub spread_base: f64,
    /// Ceiling on the boosted spread chance
    pub spread_cap: f64,
    /// Longest action a rumor can redirect a character into
    pub influence_max_duration: u32,
}

impl Default for RumorConfig {
    fn default() -> Self {
        Self {
            birth_probability: 1.0,
            trigger_boost: 0.05,
            initial_credibility: 0.8,
            min_initial_credibility: 0.3,
            mutation_probability: 0.9,
            mutation_penalty: 0.1,
            credibility_floor: 0.1,
            spread_base: 0.35,
            spread_cap: 0.6,
            influence_max_duration: 30,
        }
    }
}

/// Parameters for records written to memory stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub importance: u8,
    pub embedding_dim: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            importance: 3,
            embedding_dim: 1536,
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid value for {var}: '{value}'")]
    EnvOverride { var: String, value: String },
    #[error("invalid tuning: {0}")]
    Invalid(String),
}
