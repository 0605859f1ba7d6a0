//! Forest fire simulation run
//!
//! `Simulation` owns everything a run needs:
//! - the forest grid and its trees
//! - the step scheduler
//! - one seeded `ChaCha8Rng`, the only source of randomness in the run
//! - the tick counter and history
//!
//! A run moves `Initializing → Running → Finished`. Construction places trees
//! and lights the initial fires; every [`Simulation::advance_tick`] steps the
//! whole grid once; the run finishes when the tick counter reaches the
//! horizon, whether or not any fire is left.
//!
//! Random draws are consumed in a fixed order so a seed reproduces a run:
//! 1. Construction, per position with `x` outer and `y` inner: placement roll,
//!    flamability draw(s) for a placed tree, then the starter-stage ignition
//!    roll when that seeding is active.
//! 2. Each tick: one visit-order permutation, then every visited tree's rolls
//!    in neighbourhood order.

pub mod config;
pub mod ensemble;
pub mod scheduler;
pub mod stats;

pub use config::{
    IgnitionSeeding, SimulationConfig, StarterSuppression, DEFAULT_GROWTH_RATE, DEFAULT_HORIZON,
};
pub use ensemble::{density_sweep, run_ensemble, SweepPoint};
pub use scheduler::StepScheduler;
pub use stats::{History, Snapshot, TickStats};

use crate::core_types::{Cell, FlamabilitySampler, Position, TransitionRules};
use crate::error::{Result, SimulationError};
use crate::grid::ForestGrid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Trees are being placed. Only held inside [`Simulation::new`]; a built
    /// run is always `Running` or `Finished`.
    Initializing,
    /// Ticks remain before the horizon
    Running,
    /// Horizon reached; no further ticks
    Finished,
}

/// A single forest fire run.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    rules: TransitionRules,
    grid: ForestGrid,
    scheduler: StepScheduler,
    rng: ChaCha8Rng,
    tick: u32,
    phase: Phase,
    initial_stats: TickStats,
    history: History,
}

/// Build a run from `config`.
///
/// # Errors
///
/// Returns [`SimulationError::InvalidConfiguration`] if `config` does not validate.
pub fn run(config: SimulationConfig) -> Result<Simulation> {
    Simulation::new(config)
}

impl Simulation {
    /// Validate `config`, place the trees and light the initial fires.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfiguration`] if `config` does not validate.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let sampler = FlamabilitySampler::new(config.distribution)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        debug!(phase = ?Phase::Initializing, seed = config.seed, "placing trees");
        let grid = Self::plant_forest(&config, &sampler, &mut rng);

        let initial_stats = TickStats::from_grid(&grid, 0);
        let phase = if config.horizon == 0 {
            Phase::Finished
        } else {
            Phase::Running
        };

        info!(
            width = config.width,
            height = config.height,
            density = config.density,
            distribution = %sampler.kind(),
            trees = grid.tree_count(),
            initially_burning = initial_stats.on_fire_count,
            horizon = config.horizon,
            "created forest fire simulation"
        );

        Ok(Self {
            rules: config.transition_rules(),
            history: History::with_capacity(config.horizon as usize),
            config,
            grid,
            scheduler: StepScheduler::new(),
            rng,
            tick: 0,
            phase,
            initial_stats,
        })
    }

    /// Place a tree at each position with probability `density` and apply the
    /// seeding policy to each placed tree.
    fn plant_forest<R: Rng + ?Sized>(
        config: &SimulationConfig,
        sampler: &FlamabilitySampler,
        rng: &mut R,
    ) -> ForestGrid {
        let mut grid = ForestGrid::new(config.width, config.height);
        let seeding = config.seeding();
        let suppress_whole_run = seeding == IgnitionSeeding::StarterStage
            && config.starter_suppression == StarterSuppression::WholeRun;

        for x in 0..config.width {
            for y in 0..config.height {
                if rng.random::<f64>() >= config.density {
                    continue;
                }
                let mut tree =
                    Cell::initialize(Position::new(x, y), sampler, suppress_whole_run, rng);

                match seeding {
                    IgnitionSeeding::LeftEdge => {
                        if x == 0 {
                            tree.ignite();
                        }
                    }
                    IgnitionSeeding::StarterStage => {
                        let p = tree.effective_flamability() / f64::from(config.horizon.max(1));
                        if rng.random::<f64>() < p {
                            tree.ignite();
                            tree.set_ignited_before_start(true);
                        }
                    }
                    IgnitionSeeding::Spontaneous => {}
                }

                grid.insert(tree);
            }
        }
        grid
    }

    /// Advance the whole grid by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::SimulationFinished`] once the horizon is reached.
    pub fn advance_tick(&mut self) -> Result<TickStats> {
        if self.phase == Phase::Finished {
            return Err(SimulationError::SimulationFinished {
                horizon: self.config.horizon,
            });
        }

        self.tick += 1;
        let stats = self.scheduler.step(
            &mut self.grid,
            &mut self.history,
            &self.rules,
            self.tick,
            &mut self.rng,
        );
        debug!(
            tick = self.tick,
            fine = stats.fine_count,
            on_fire = stats.on_fire_count,
            burned_out = stats.burned_out_count,
            mean_flamability = stats.mean_flamability_of_fine,
            "tick complete"
        );

        if self.tick >= self.config.horizon {
            self.phase = Phase::Finished;
            info!(
                horizon = self.config.horizon,
                burned_out = stats.burned_out_count,
                trees = self.grid.tree_count(),
                "simulation finished"
            );
        }
        Ok(stats)
    }

    /// Advance until the horizon and return the history.
    pub fn run_to_horizon(&mut self) -> &History {
        while self.advance_tick().is_ok() {}
        &self.history
    }

    /// Picture of the grid at the current tick.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_grid(&self.grid, self.tick)
    }

    /// Per-tick series recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Counts taken right after construction, before the first tick.
    pub fn initial_stats(&self) -> TickStats {
        self.initial_stats
    }

    /// Ticks completed.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether further ticks can be taken.
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Configuration the run was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Transition parameters derived from the configuration.
    pub fn rules(&self) -> &TransitionRules {
        &self.rules
    }

    /// Number of trees placed at construction.
    pub fn tree_count(&self) -> usize {
        self.grid.tree_count()
    }

    /// Read-only view of the grid.
    pub fn grid(&self) -> &ForestGrid {
        &self.grid
    }

    /// Tree at column `x`, row `y`, if any.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(Position::new(x, y))
    }
}
