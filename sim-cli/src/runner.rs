//! Owns a simulator together with the scene it was built from.
//!
//! [`Runner`] seeds a single root at the origin, spawns the attractor
//! cloud described by a [`Scene`], and drives [`Simulator::run`].

use glam::DVec3;
use sca_core::{
    attractor::AttractorSet,
    config::Config,
    error::ConfigError,
    rng::GrowthRng,
    simulator::{RunLimits, RunSummary, Simulator},
    surface::{GroundPlane, NoSurface, Surface},
};
use std::time::Duration;
use tracing::debug;

/// Attractor cloud and environment for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scene {
    pub attractors: usize,
    pub cloud_half_extent: f64,
    pub cloud_height: f64,
    /// Whether a climbable plane sits at `z = 0`.
    pub ground: bool,
}

/// Main state for a headless run.
///
/// ### Fields
/// - `cfg` - Growth parameters the simulator was built from.
/// - `scene` - Attractor cloud and surface description.
/// - `sim` - The simulator itself.
#[derive(Debug)]
pub struct Runner {
    cfg: Config,
    scene: Scene,
    sim: Simulator,
}

impl Runner {
    /// Creates a runner with one root at the origin and a fresh cloud.
    ///
    /// The cloud is drawn from its own generator seeded with the growth
    /// seed, so one seed pins down the whole run.
    ///
    /// ### Returns
    /// The runner, or the [`ConfigError`] that rejected `cfg`.
    pub fn new(cfg: Config, scene: Scene) -> Result<Self, ConfigError> {
        let sim = Self::build(&cfg, &scene)?;
        Ok(Self { cfg, scene, sim })
    }

    fn build(cfg: &Config, scene: &Scene) -> Result<Simulator, ConfigError> {
        let surface: Box<dyn Surface> = if scene.ground {
            Box::new(GroundPlane::new(0.0))
        } else {
            Box::new(NoSurface)
        };
        let mut sim = Simulator::with_surface(cfg, surface)?;
        sim.seed(DVec3::ZERO)?;

        let mut rng = GrowthRng::from_seed(cfg.random_seed);
        let cloud = AttractorSet::random_in_box(
            DVec3::new(0.0, 0.0, scene.cloud_height),
            DVec3::splat(scene.cloud_half_extent),
            scene.attractors,
            &mut rng,
        );
        debug!(count = cloud.len(), "spawned attractor cloud");
        sim.add_attractors(cloud)?;
        Ok(sim)
    }

    /// Restarts from scratch with the same configuration and scene.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.sim = Self::build(&self.cfg, &self.scene)?;
        Ok(())
    }

    /// Advances the simulation by a single step.
    pub fn step_once(&mut self) -> bool {
        self.sim.step()
    }

    /// Steps until the simulator halts or a limit is reached.
    pub fn run(&mut self, max_steps: Option<usize>, time_budget: Option<Duration>) -> RunSummary {
        self.sim.run(RunLimits {
            max_steps,
            time_budget,
        })
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene {
            attractors: 50,
            cloud_half_extent: 5.0,
            cloud_height: 8.0,
            ground: false,
        }
    }

    fn config() -> Config {
        Config {
            max_floating_length: 100.0,
            max_branch_length: 6.0,
            random_seed: 42,
            ..Config::default()
        }
    }

    #[test]
    fn new_seeds_one_root_and_the_cloud() {
        let runner = Runner::new(config(), scene()).unwrap();
        let sim = runner.simulator();
        assert_eq!(sim.tree().roots.len(), 1);
        assert_eq!(sim.tree().nodes.len(), 1);
        assert_eq!(sim.attractors().len(), 50);
    }

    #[test]
    fn new_rejects_bad_config() {
        let cfg = Config {
            step_size: 0.0,
            ..config()
        };
        assert_eq!(
            Runner::new(cfg, scene()).unwrap_err(),
            ConfigError::NonPositiveStepSize(0.0)
        );
    }

    #[test]
    fn reset_restores_basic_state() {
        let mut runner = Runner::new(config(), scene()).unwrap();
        for _ in 0..5 {
            runner.step_once();
        }
        assert!(runner.simulator().tree().nodes.len() > 1);

        runner.reset().unwrap();

        let sim = runner.simulator();
        assert_eq!(sim.tree().nodes.len(), 1);
        assert_eq!(sim.attractors().len(), 50);
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn run_stops_within_limits() {
        let mut runner = Runner::new(config(), scene()).unwrap();
        let summary = runner.run(Some(500), None);
        assert!(summary.steps <= 500);
        assert!(runner.simulator().max_length() <= 6.0);
    }

    #[test]
    fn ground_scene_climbs() {
        let scene = Scene {
            ground: true,
            ..scene()
        };
        let mut runner = Runner::new(config(), scene).unwrap();
        runner.step_once();
        assert!(runner.simulator().tree().nodes.iter().any(|n| n.climbing));
    }
}
