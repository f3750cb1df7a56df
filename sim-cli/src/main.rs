//! Headless entry point for the 3D SCA growth simulator.
//!
//! This binary parses the command line, installs a `tracing` subscriber and
//! delegates the simulation run to [`Runner`] from the `runner` module.

mod runner;

use clap::Parser;
use runner::{Runner, Scene};
use sca_core::config::Config;
use std::{process::ExitCode, time::Duration};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Grow a branching structure toward a cloud of attractors.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Random seed for growth and the attractor cloud.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of attractors in the cloud.
    #[arg(long, default_value_t = 500)]
    attractors: usize,

    /// Half extent of the cubical attractor cloud.
    #[arg(long, default_value_t = 5.0)]
    cloud_half_extent: f64,

    /// Height of the cloud's center above the seed point.
    #[arg(long, default_value_t = 8.0)]
    cloud_height: f64,

    /// Place a climbable ground plane at z = 0.
    #[arg(long)]
    ground: bool,

    #[arg(long, default_value_t = 0.3)]
    step_size: f64,

    /// Kill radius in step sizes.
    #[arg(long, default_value_t = 5.0)]
    kill_distance: f64,

    /// Influence radius in step sizes.
    #[arg(long, default_value_t = 15.0)]
    influence_distance: f64,

    #[arg(long, default_value_t = 0.05)]
    branching_probability: f64,

    #[arg(long, default_value_t = 5.0)]
    max_floating_length: f64,

    #[arg(long, default_value_t = 30.0)]
    max_branch_length: f64,

    #[arg(long, default_value_t = 3)]
    max_generation: u32,

    /// Stop after this many steps.
    #[arg(long, default_value_t = 2000)]
    max_steps: usize,

    /// Stop after this many seconds of wall-clock time.
    #[arg(long)]
    time_budget: Option<f64>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            step_size: self.step_size,
            kill_distance: self.kill_distance,
            influence_distance: self.influence_distance,
            branching_probability: self.branching_probability,
            max_floating_length: self.max_floating_length,
            max_branch_length: self.max_branch_length,
            max_generation: self.max_generation,
            random_seed: self.seed,
            ..Config::default()
        }
    }

    fn scene(&self) -> Scene {
        Scene {
            attractors: self.attractors,
            cloud_half_extent: self.cloud_half_extent,
            cloud_height: self.cloud_height,
            ground: self.ground,
        }
    }
}

/// Runs the simulation to completion and logs a summary.
///
/// ### Returns
/// - `ExitCode::SUCCESS` when the run completed.
/// - `ExitCode::FAILURE` when the parameters were rejected.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let time_budget = args
        .time_budget
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64);

    let mut runner = match Runner::new(args.config(), args.scene()) {
        Ok(runner) => runner,
        Err(err) => {
            error!(%err, "invalid parameters");
            return ExitCode::FAILURE;
        }
    };

    let summary = runner.run(Some(args.max_steps), time_budget);
    let tree = runner.simulator().tree();
    let dead = tree.roots.iter().filter(|r| !r.alive).count();
    info!(
        halt = ?summary.halt,
        steps = summary.steps,
        elapsed_ms = summary.elapsed.as_millis(),
        roots = tree.roots.len(),
        dead_roots = dead,
        nodes = tree.nodes.len(),
        attractors_left = runner.simulator().attractors().len(),
        max_length = runner.simulator().max_length(),
        index_height = runner.simulator().tip_index().height(),
        "run finished"
    );
    ExitCode::SUCCESS
}
