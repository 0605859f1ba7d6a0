//! Forest Fire Simulation Core Library
//!
//! A stochastic cellular model of wildfire spread through a forest of trees
//! with individual, drying (ever more flammable) fuel.
//!
//! ## Model
//!
//! - Trees sit on a bounded 2D grid, placed independently with a given density
//! - Each tree has a flamability drawn from a uniform, normal, bimodal or
//!   constant distribution, growing every tick as the fuel dries
//! - A burning tree exposes its fine neighbours; repeated exposure compounds
//!   the chance of ignition
//! - Fine trees may also ignite spontaneously
//! - Trees are visited in a fresh random order every tick, for a fixed horizon
//!
//! ## Example
//!
//! ```
//! use forest_fire_core::{FlamabilityDistribution, Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::new(50, 50, 0.6, FlamabilityDistribution::Bimodal).with_seed(7);
//! let mut sim = Simulation::new(config)?;
//! let history = sim.run_to_horizon();
//! assert_eq!(history.len(), 90);
//! # Ok::<(), forest_fire_core::SimulationError>(())
//! ```

// Core types: trees and flamability
pub mod core_types;

// Error types
pub mod error;

// Grid storage and neighbourhoods
pub mod grid;

// Run lifecycle, scheduling and statistics
pub mod simulation;

// Re-export core types
pub use core_types::{
    Cell, FireState, FlamabilityDistribution, FlamabilitySampler, Position, SpreadModel,
    TransitionRules,
};
pub use error::SimulationError;

// Re-export grid types
pub use grid::{ForestGrid, Neighborhood};

// Re-export simulation types
pub use simulation::{
    density_sweep, run, run_ensemble, History, IgnitionSeeding, Phase, Simulation,
    SimulationConfig, Snapshot, StarterSuppression, StepScheduler, SweepPoint, TickStats,
};
