//! Core configuration for cadence-animation-core.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;

/// Which host update loop drives a timeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessMode {
    /// Advanced once per rendered frame.
    #[default]
    Idle,
    /// Advanced on the fixed physics step.
    Physics,
}

/// Runtime and scheduling defaults.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Easing used when neither the keyframe nor its track names one.
    pub default_ease: Ease,
    /// Upper bound on loop wraps handled within a single tick.
    pub max_wraps_per_tick: u32,
    /// Tolerance used when deciding that a segment's from and to values are equal.
    pub epsilon: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ease: Ease::Linear,
            max_wraps_per_tick: 64,
            epsilon: 1e-6,
        }
    }
}
