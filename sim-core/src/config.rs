//! User-facing growth parameters and their validated, derived form.

use crate::error::ConfigError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Growth parameters as a caller states them.
///
/// Probabilities are the chance of the *event* happening (a lateral branch,
/// a leaf). Distances for kill and influence are multiples of `step_size`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Weight of the carried-over growth direction.
    pub primary_weight: f64,
    /// Weight of the upward-biased random direction.
    pub random_weight: f64,
    /// Weight of the pull toward a nearby surface.
    pub adhesion_weight: f64,
    /// Chance of a lateral branch, scaled by the position along the branch.
    pub branching_probability: f64,
    /// Chance of a leaf; only consumed by mesh builders.
    pub leaf_probability: f64,
    pub step_size: f64,
    /// Distance a tip may travel without surface contact before it dies.
    pub max_floating_length: f64,
    pub max_adhesion_distance: f64,
    /// Kill radius in units of `step_size`.
    pub kill_distance: f64,
    /// Influence radius in units of `step_size`.
    pub influence_distance: f64,
    pub gravity_weight: f64,
    /// Weight of the pull toward influencing attractors.
    pub tropism: f64,
    /// Roots at this generation no longer spawn lateral roots.
    pub max_generation: u32,
    /// Growth stops once any root is this long.
    pub max_branch_length: f64,
    pub random_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_weight: 0.5,
            random_weight: 0.2,
            adhesion_weight: 0.1,
            branching_probability: 0.05,
            leaf_probability: 0.35,
            step_size: 0.3,
            max_floating_length: 0.5,
            max_adhesion_distance: 1.0,
            kill_distance: 5.0,
            influence_distance: 15.0,
            gravity_weight: 1.0,
            tropism: 0.5,
            max_generation: 3,
            max_branch_length: 50.0,
            random_seed: 0,
        }
    }
}

/// Validated parameters in the form the growth phases consume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthParams {
    pub primary_weight: f64,
    pub random_weight: f64,
    pub adhesion_weight: f64,
    /// Probability of *not* branching; a node branches when
    /// `random * weight > branching_continue`.
    pub branching_continue: f64,
    /// Probability of *not* growing a leaf.
    pub leaf_continue: f64,
    pub step_size: f64,
    pub max_floating_length: f64,
    pub max_adhesion_distance: f64,
    pub kill_distance_sq: f64,
    pub influence_distance_sq: f64,
    pub gravity_weight: f64,
    pub tropism: f64,
    pub max_generation: u32,
    pub max_branch_length: f64,
    pub random_seed: u64,
}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(value)
}

fn probability(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ProbabilityOutOfRange { name, value });
    }
    Ok(value)
}

impl GrowthParams {
    /// Validates `cfg` and derives the internal parameters.
    ///
    /// Weights are normalized once here. Event probabilities are inverted into
    /// continue probabilities. Kill and influence radii become squared
    /// absolute distances.
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let step_size = finite("step_size", cfg.step_size)?;
        if step_size <= 0.0 {
            return Err(ConfigError::NonPositiveStepSize(step_size));
        }

        let primary = non_negative("primary_weight", cfg.primary_weight)?;
        let random = non_negative("random_weight", cfg.random_weight)?;
        let adhesion = non_negative("adhesion_weight", cfg.adhesion_weight)?;
        let total = primary + random + adhesion;
        if total <= 0.0 {
            return Err(ConfigError::WeightTotal(total));
        }

        let kill = non_negative("kill_distance", cfg.kill_distance)? * step_size;
        let influence = non_negative("influence_distance", cfg.influence_distance)? * step_size;
        if kill > influence {
            return Err(ConfigError::KillExceedsInfluence { kill, influence });
        }

        Ok(Self {
            primary_weight: primary / total,
            random_weight: random / total,
            adhesion_weight: adhesion / total,
            branching_continue: 1.0
                - probability("branching_probability", cfg.branching_probability)?,
            leaf_continue: 1.0 - probability("leaf_probability", cfg.leaf_probability)?,
            step_size,
            max_floating_length: non_negative("max_floating_length", cfg.max_floating_length)?,
            max_adhesion_distance: non_negative(
                "max_adhesion_distance",
                cfg.max_adhesion_distance,
            )?,
            kill_distance_sq: kill * kill,
            influence_distance_sq: influence * influence,
            gravity_weight: non_negative("gravity_weight", cfg.gravity_weight)?,
            tropism: non_negative("tropism", cfg.tropism)?,
            max_generation: cfg.max_generation,
            max_branch_length: non_negative("max_branch_length", cfg.max_branch_length)?,
            random_seed: cfg.random_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_normalized_once() {
        let cfg = Config {
            primary_weight: 2.0,
            random_weight: 1.0,
            adhesion_weight: 1.0,
            ..Config::default()
        };
        let p = GrowthParams::from_config(&cfg).unwrap();
        assert_eq!(p.primary_weight, 0.5);
        assert_eq!(p.random_weight, 0.25);
        assert_eq!(p.adhesion_weight, 0.25);
    }

    #[test]
    fn probabilities_are_inverted() {
        let cfg = Config {
            branching_probability: 0.25,
            leaf_probability: 0.0,
            ..Config::default()
        };
        let p = GrowthParams::from_config(&cfg).unwrap();
        assert_eq!(p.branching_continue, 0.75);
        assert_eq!(p.leaf_continue, 1.0);
    }

    #[test]
    fn radii_are_squared_multiples_of_step() {
        let cfg = Config {
            step_size: 0.5,
            kill_distance: 2.0,
            influence_distance: 6.0,
            ..Config::default()
        };
        let p = GrowthParams::from_config(&cfg).unwrap();
        assert_eq!(p.kill_distance_sq, 1.0);
        assert_eq!(p.influence_distance_sq, 9.0);
    }

    #[test]
    fn rejects_bad_step_size() {
        for step_size in [0.0, -1.0] {
            let cfg = Config {
                step_size,
                ..Config::default()
            };
            assert_eq!(
                GrowthParams::from_config(&cfg),
                Err(ConfigError::NonPositiveStepSize(step_size))
            );
        }
        let cfg = Config {
            step_size: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(
            GrowthParams::from_config(&cfg),
            Err(ConfigError::NonFinite {
                name: "step_size",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_weight_total() {
        let cfg = Config {
            primary_weight: 0.0,
            random_weight: 0.0,
            adhesion_weight: 0.0,
            ..Config::default()
        };
        assert_eq!(
            GrowthParams::from_config(&cfg),
            Err(ConfigError::WeightTotal(0.0))
        );
    }

    #[test]
    fn rejects_kill_beyond_influence() {
        let cfg = Config {
            kill_distance: 10.0,
            influence_distance: 5.0,
            ..Config::default()
        };
        assert!(matches!(
            GrowthParams::from_config(&cfg),
            Err(ConfigError::KillExceedsInfluence { .. })
        ));
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let cfg = Config {
            branching_probability: 1.5,
            ..Config::default()
        };
        assert!(matches!(
            GrowthParams::from_config(&cfg),
            Err(ConfigError::ProbabilityOutOfRange {
                name: "branching_probability",
                ..
            })
        ));
    }
}
