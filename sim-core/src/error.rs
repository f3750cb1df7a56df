//! Error types for configuring a growth simulation.

use thiserror::Error;

/// A precondition violation detected while building or seeding a simulator.
///
/// These are never produced by [`crate::simulator::Simulator::step`]; once a
/// simulator exists, growth has no failure modes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter was NaN or infinite.
    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The step size was zero or negative.
    #[error("step size must be positive, got {0}")]
    NonPositiveStepSize(f64),

    /// A distance, length or multiplier was negative.
    #[error("parameter `{name}` must not be negative, got {value}")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A probability was outside `[0, 1]`.
    #[error("probability `{name}` must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Primary, random and adhesion weights did not add up to a positive total.
    #[error("growth weights must sum to a positive total, got {0}")]
    WeightTotal(f64),

    /// The kill radius was larger than the influence radius.
    #[error("kill distance {kill} exceeds influence distance {influence}")]
    KillExceedsInfluence {
        /// Kill distance (unsquared).
        kill: f64,
        /// Influence distance (unsquared).
        influence: f64,
    },

    /// A seed point or attractor had a non-finite coordinate.
    #[error("point {0} has a non-finite coordinate")]
    NonFinitePoint(glam::DVec3),
}
