//! The growth simulator: owns the branch graph, the tip index, the
//! attractors and the random stream, and advances them one step at a time.

use crate::{
    attractor::AttractorSet,
    config::{Config, GrowthParams},
    error::ConfigError,
    influence_buffer::InfluenceBuffer,
    phases::{self, TipIndex},
    rng::GrowthRng,
    surface::{NoSurface, Surface},
    tree::Tree,
    types::{Point3, RootId},
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Why a simulation stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    NoLiveRoots,
    AttractorsExhausted,
    LengthBudgetReached,
    StepLimit,
    TimeBudget,
}

/// What happened during the most recent [`Simulator::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub grown: usize,
    pub died: usize,
    pub spawned: usize,
    pub killed: usize,
    /// Tips with at least one influencing attractor after the step.
    pub influenced_tips: usize,
}

/// Bounds for [`Simulator::run`], checked between steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunLimits {
    pub max_steps: Option<usize>,
    pub time_budget: Option<Duration>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub halt: HaltReason,
    pub elapsed: Duration,
}

/// Space colonization growth engine.
///
/// Seed one or more roots, add attractors, then call [`Simulator::step`]
/// until it returns `false`. Identical configuration, attractors and surface
/// reproduce an identical branch graph.
#[derive(Debug)]
pub struct Simulator {
    params: GrowthParams,
    tree: Tree,
    index: TipIndex,
    attractors: AttractorSet,
    pulls: InfluenceBuffer,
    /// Set when tips or attractors changed outside a step.
    pulls_stale: bool,
    rng: GrowthRng,
    surface: Box<dyn Surface>,
    max_length: f64,
    steps: usize,
    last_stats: StepStats,
}

impl Simulator {
    /// Creates a simulator growing in empty space.
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        Self::with_surface(cfg, Box::new(NoSurface))
    }

    pub fn with_surface(cfg: &Config, surface: Box<dyn Surface>) -> Result<Self, ConfigError> {
        let params = GrowthParams::from_config(cfg)?;
        Ok(Self {
            rng: GrowthRng::from_seed(params.random_seed),
            params,
            tree: Tree::new(),
            index: TipIndex::new(),
            attractors: AttractorSet::default(),
            pulls: InfluenceBuffer::default(),
            pulls_stale: true,
            surface,
            max_length: 0.0,
            steps: 0,
            last_stats: StepStats::default(),
        })
    }

    /// Starts a new root growing from `position`.
    pub fn seed(&mut self, position: Point3) -> Result<RootId, ConfigError> {
        if !position.is_finite() {
            return Err(ConfigError::NonFinitePoint(position));
        }
        let (root, start) = self.tree.add_root(position, 0.0, 0, None);
        phases::register_tip(&mut self.tree, &mut self.index, start);
        self.max_length = self.max_length.max(self.tree.nodes[start].cumulative_length);
        self.pulls_stale = true;
        Ok(root)
    }

    pub fn add_attractors(&mut self, points: AttractorSet) -> Result<(), ConfigError> {
        if let Some(bad) = points.points.iter().find(|p| !p.is_finite()) {
            return Err(ConfigError::NonFinitePoint(*bad));
        }
        self.attractors.extend(points);
        self.pulls_stale = true;
        Ok(())
    }

    pub fn params(&self) -> &GrowthParams {
        &self.params
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn tip_index(&self) -> &TipIndex {
        &self.index
    }

    pub fn attractors(&self) -> &AttractorSet {
        &self.attractors
    }

    /// Longest `cumulative_length` reached by any root so far.
    pub fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Number of steps that advanced the simulation.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// The reason growth cannot continue, if any.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        if self.tree.alive_roots().next().is_none() {
            Some(HaltReason::NoLiveRoots)
        } else if self.attractors.is_empty() {
            Some(HaltReason::AttractorsExhausted)
        } else if self.max_length >= self.params.max_branch_length {
            Some(HaltReason::LengthBudgetReached)
        } else {
            None
        }
    }

    /// Runs one growth iteration.
    ///
    /// Returns whether another step can make progress. Once it has returned
    /// `false`, further calls do nothing.
    pub fn step(&mut self) -> bool {
        if self.halt_reason().is_some() {
            return false;
        }

        let mut stats = StepStats::default();
        if self.pulls_stale {
            stats.killed += self.attract();
        }

        let updates = phases::advance_phase(
            &self.tree,
            &self.pulls,
            &self.params,
            self.surface.as_ref(),
            &mut self.rng,
        );
        let applied = phases::apply_tip_updates(&mut self.tree, &mut self.index, updates);
        self.max_length = self.max_length.max(applied.max_length);
        stats.grown = applied.grown;
        stats.died = applied.died;

        let spawned =
            phases::branching_phase(&mut self.tree, &mut self.index, &self.params, &mut self.rng);
        stats.spawned = spawned.len();

        stats.killed += self.attract();
        stats.influenced_tips = self.pulls.influenced_indices().count();

        self.steps += 1;
        self.last_stats = stats;
        debug!(
            step = self.steps,
            grown = stats.grown,
            died = stats.died,
            spawned = stats.spawned,
            killed = stats.killed,
            influenced = stats.influenced_tips,
            attractors = self.attractors.len(),
            max_length = self.max_length,
            "growth step"
        );

        match self.halt_reason() {
            Some(reason) => {
                info!(
                    ?reason,
                    steps = self.steps,
                    roots = self.tree.roots.len(),
                    nodes = self.tree.nodes.len(),
                    max_length = self.max_length,
                    "growth halted"
                );
                false
            }
            None => true,
        }
    }

    /// Steps until growth halts or a limit is hit.
    pub fn run(&mut self, limits: RunLimits) -> RunSummary {
        let start = Instant::now();
        let mut steps = 0;

        let halt = loop {
            if let Some(reason) = self.halt_reason() {
                break reason;
            }
            if limits.max_steps.is_some_and(|max| steps >= max) {
                break HaltReason::StepLimit;
            }
            if limits.time_budget.is_some_and(|budget| start.elapsed() >= budget) {
                break HaltReason::TimeBudget;
            }
            self.step();
            steps += 1;
        };

        RunSummary {
            steps,
            halt,
            elapsed: start.elapsed(),
        }
    }

    /// Recomputes pulls against the current tips and drops reached attractors.
    fn attract(&mut self) -> usize {
        let mut outcome = phases::attraction_phase(
            &self.tree,
            &self.index,
            &self.attractors,
            &self.params,
            &mut self.pulls,
        );
        let killed = outcome.killed.len();
        self.attractors.remove_indices(&mut outcome.killed);
        self.pulls_stale = false;
        killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::GroundPlane;
    use glam::DVec3;

    fn cloud(seed: u64, count: usize) -> AttractorSet {
        let mut rng = GrowthRng::from_seed(seed);
        AttractorSet::random_in_box(DVec3::new(0.0, 0.0, 8.0), DVec3::splat(5.0), count, &mut rng)
    }

    fn scenario_config() -> Config {
        Config {
            step_size: 0.3,
            kill_distance: 5.0,
            influence_distance: 15.0,
            random_seed: 42,
            ..Config::default()
        }
    }

    fn long_lived_config() -> Config {
        Config {
            max_floating_length: 1000.0,
            max_branch_length: 30.0,
            tropism: 1.0,
            max_generation: 2,
            ..scenario_config()
        }
    }

    fn simulator(cfg: &Config) -> Simulator {
        let mut sim = Simulator::new(cfg).unwrap();
        sim.seed(DVec3::ZERO).unwrap();
        sim.add_attractors(cloud(42, 50)).unwrap();
        sim
    }

    /// Every parent precedes its child in the arena, and parent walks end.
    fn assert_forest(tree: &Tree) {
        for (id, node) in tree.nodes.iter().enumerate() {
            if let Some(p) = node.parent {
                assert!(p < id, "node {id} has parent {p} after it");
            }
            let mut hops = 0;
            let mut current = node.parent;
            while let Some(p) = current {
                hops += 1;
                assert!(hops <= tree.nodes.len(), "cycle through node {id}");
                current = tree.nodes[p].parent;
            }
        }
    }

    #[test]
    fn rejects_invalid_config_and_seed() {
        let bad = Config {
            step_size: -0.1,
            ..Config::default()
        };
        assert!(Simulator::new(&bad).is_err());

        let mut sim = Simulator::new(&Config::default()).unwrap();
        assert!(matches!(
            sim.seed(DVec3::new(0.0, f64::INFINITY, 0.0)),
            Err(ConfigError::NonFinitePoint(_))
        ));
        assert!(sim.tree().roots.is_empty());
    }

    #[test]
    fn seed_creates_single_node_root() {
        let mut sim = Simulator::new(&Config::default()).unwrap();
        let root = sim.seed(DVec3::new(1.0, 2.0, 3.0)).unwrap();

        let tree = sim.tree();
        assert_eq!(tree.roots[root].nodes.len(), 1);
        let node = &tree.nodes[tree.tip(root)];
        assert_eq!(node.primary_direction, DVec3::Z);
        assert!(node.cumulative_length > 0.0);
        assert_eq!(sim.tip_index().active_len(), 1);
    }

    #[test]
    fn step_without_attractors_or_roots_halts() {
        let mut sim = Simulator::new(&Config::default()).unwrap();
        assert_eq!(sim.halt_reason(), Some(HaltReason::NoLiveRoots));
        assert!(!sim.step());

        sim.seed(DVec3::ZERO).unwrap();
        assert_eq!(sim.halt_reason(), Some(HaltReason::AttractorsExhausted));
        assert!(!sim.step());
        assert_eq!(sim.tree().nodes.len(), 1);
    }

    #[test]
    fn identical_inputs_grow_identical_graphs() {
        let cfg = long_lived_config();
        let mut a = simulator(&cfg);
        let mut b = simulator(&cfg);

        for _ in 0..60 {
            a.step();
            b.step();
        }

        let bits = |sim: &Simulator| -> Vec<[u64; 3]> {
            sim.tree()
                .nodes
                .iter()
                .map(|n| n.position.to_array().map(f64::to_bits))
                .collect()
        };
        assert!(a.tree().nodes.len() > 1);
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.attractors().points, b.attractors().points);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = {
            let mut sim = simulator(&long_lived_config());
            sim.run(RunLimits {
                max_steps: Some(20),
                ..RunLimits::default()
            });
            sim.into_tree()
        };
        let b = {
            let cfg = Config {
                random_seed: 43,
                ..long_lived_config()
            };
            let mut sim = simulator(&cfg);
            sim.run(RunLimits {
                max_steps: Some(20),
                ..RunLimits::default()
            });
            sim.into_tree()
        };
        assert_ne!(a.nodes[5].position, b.nodes[5].position);
    }

    #[test]
    fn end_to_end_scenario_halts_as_a_forest() {
        let cfg = scenario_config();
        let mut sim = simulator(&cfg);

        let summary = sim.run(RunLimits {
            max_steps: Some(2000),
            ..RunLimits::default()
        });

        assert_ne!(summary.halt, HaltReason::StepLimit);
        let some_root_died = sim.tree().roots.iter().any(|r| !r.alive);
        assert!(some_root_died || sim.attractors().is_empty());
        assert!(sim.max_length() <= cfg.max_branch_length);
        assert_forest(sim.tree());
        assert!(!sim.step(), "halted simulator kept growing");
    }

    #[test]
    fn long_growth_keeps_graph_invariants() {
        let cfg = long_lived_config();
        let mut sim = simulator(&cfg);

        let summary = sim.run(RunLimits {
            max_steps: Some(2000),
            ..RunLimits::default()
        });
        assert!(summary.steps < 2000, "did not halt: {summary:?}");
        assert!(sim.attractors().len() < 50, "no attractor was reached");
        assert!(sim.max_length() <= cfg.max_branch_length);

        let tree = sim.tree();
        assert_forest(tree);
        assert!(tree.roots.len() > 1, "no lateral roots spawned");

        for root in &tree.roots {
            assert!(root.generation <= cfg.max_generation);
            for pair in root.nodes.windows(2) {
                let (a, b) = (&tree.nodes[pair[0]], &tree.nodes[pair[1]]);
                assert!(
                    b.cumulative_length > a.cumulative_length,
                    "length not increasing: {} then {}",
                    a.cumulative_length,
                    b.cumulative_length
                );
                assert!((b.primary_direction.length() - 1.0).abs() < 1e-9);
            }
        }

        // Only tips of live roots remain attraction targets.
        let live_tips = tree.alive_roots().count();
        assert_eq!(sim.tip_index().active_len(), live_tips);
    }

    #[test]
    fn climbing_nodes_have_no_floating_length() {
        let cfg = Config {
            max_adhesion_distance: 0.5,
            max_floating_length: 2.0,
            ..long_lived_config()
        };
        let mut sim = Simulator::with_surface(&cfg, Box::new(GroundPlane::new(0.0))).unwrap();
        sim.seed(DVec3::new(0.0, 0.0, 0.1)).unwrap();
        sim.add_attractors(cloud(7, 50)).unwrap();
        sim.run(RunLimits {
            max_steps: Some(100),
            ..RunLimits::default()
        });

        let tree = sim.tree();
        assert!(tree.nodes.iter().any(|n| n.climbing));
        for node in tree.nodes.iter().filter(|n| n.climbing) {
            assert_eq!(node.floating_length, 0.0);
        }
    }

    #[test]
    fn run_respects_step_limit() {
        let mut sim = simulator(&long_lived_config());
        let summary = sim.run(RunLimits {
            max_steps: Some(3),
            ..RunLimits::default()
        });
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.halt, HaltReason::StepLimit);
        assert_eq!(sim.steps(), 3);
    }

    #[test]
    fn zero_time_budget_stops_before_stepping() {
        let mut sim = simulator(&long_lived_config());
        let summary = sim.run(RunLimits {
            time_budget: Some(Duration::ZERO),
            ..RunLimits::default()
        });
        assert_eq!(summary.halt, HaltReason::TimeBudget);
        assert_eq!(summary.steps, 0);
    }
}
