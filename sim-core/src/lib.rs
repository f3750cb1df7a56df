//! Procedural 3-D branch growth by space colonization.
//!
//! Main components:
//! - [`kdtree`] — append-only k-d tree with logical deletion, used to find
//!   the nearest live tip for each attractor.
//! - [`simulator`] — the growth engine driving the per-step phases.
//! - [`phases`] — tip advancement, branching and attraction.
//! - [`tree`] — branch nodes and roots (the output graph).
//! - [`attractor`] — attractor points and spawners.
//! - [`config`] — user parameters and their validated form.
//! - [`surface`] — collision/adhesion geometry capability.
//! - [`influence_buffer`] — per-tip accumulated attractor pull.
//! - [`rng`], [`aabb`], [`error`], [`types`] — supporting pieces.
//!
//! ```
//! use glam::DVec3;
//! use sca_core::{attractor::AttractorSet, config::Config, rng::GrowthRng, simulator::Simulator};
//!
//! let cfg = Config {
//!     max_floating_length: 100.0,
//!     max_branch_length: 10.0,
//!     ..Config::default()
//! };
//! let mut sim = Simulator::new(&cfg).unwrap();
//! sim.seed(DVec3::ZERO).unwrap();
//!
//! let mut rng = GrowthRng::from_seed(1);
//! let cloud = AttractorSet::random_in_sphere(DVec3::new(0.0, 0.0, 6.0), 4.0, 200, &mut rng);
//! sim.add_attractors(cloud).unwrap();
//!
//! while sim.step() {}
//! assert!(sim.tree().nodes.len() > 1);
//! ```

pub mod aabb;
pub mod attractor;
pub mod config;
pub mod error;
pub mod influence_buffer;
pub mod kdtree;
pub mod phases;
pub mod rng;
pub mod simulator;
pub mod surface;
pub mod tree;
pub mod types;
