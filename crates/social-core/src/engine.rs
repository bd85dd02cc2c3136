//! Social Engine
//!
//! Bundles the rumor and scene engines behind one shared configuration and
//! text filter.

use rand::Rng;
use std::sync::Arc;

use social_events::{Rumor, SceneEvent};

use crate::character::Character;
use crate::config::TuningConfig;
use crate::rumor::RumorEngine;
use crate::sanitize::{TextFilter, WorldSanitizer};
use crate::scene::SceneEngine;

/// What one pairwise interaction produced.
///
/// Nothing is written to memory; the caller decides who records what.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionOutcome {
    pub rumor: Option<Rumor>,
    pub scene: Option<SceneEvent>,
}

impl InteractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.rumor.is_none() && self.scene.is_none()
    }
}

pub struct SocialEngine {
    config: TuningConfig,
    rumors: RumorEngine,
    scenes: SceneEngine,
}

impl SocialEngine {
    /// Engine with the default garden text filter.
    pub fn new(config: TuningConfig) -> Self {
        Self::with_filter(config, Arc::new(WorldSanitizer::new()))
    }

    pub fn with_filter(config: TuningConfig, filter: Arc<dyn TextFilter>) -> Self {
        let rumors = RumorEngine::new(config.rumor.clone(), config.memory.clone(), Arc::clone(&filter));
        let scenes = SceneEngine::new(config.scene.clone(), config.memory.clone(), filter);
        Self {
            config,
            rumors,
            scenes,
        }
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    pub fn rumors(&self) -> &RumorEngine {
        &self.rumors
    }

    pub fn scenes(&self) -> &SceneEngine {
        &self.scenes
    }

    /// Runs both engines for one interaction, rumor first.
    pub fn interact<R, A, B>(
        &self,
        rng: &mut R,
        initiator: &mut Character<A>,
        target: &mut Character<B>,
        location: &str,
        summary: &str,
    ) -> InteractionOutcome
    where
        R: Rng + ?Sized,
    {
        let rumor = self.rumors.maybe_generate_rumor(rng, initiator, target, location, summary);
        let scene = self.scenes.maybe_trigger_scene(rng, initiator, target, location, summary);
        InteractionOutcome { rumor, scene }
    }
}

impl Default for SocialEngine {
    fn default() -> Self {
        Self::new(TuningConfig::default())
    }
}
