//! Run configuration
//!
//! A [`SimulationConfig`] is validated once when a run is built; after that
//! nothing in a run can fail.

use crate::core_types::{Cell, FlamabilityDistribution, SpreadModel, TransitionRules};
use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reference run length in ticks.
pub const DEFAULT_HORIZON: u32 = 90;

/// Reference per-tick flamability growth.
pub const DEFAULT_GROWTH_RATE: f64 = 0.02;

/// How fires are lit at tick 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnitionSeeding {
    /// Every tree in column `x == 0` starts on fire
    LeftEdge,
    /// Every tree ignites with probability `flamability / horizon`
    StarterStage,
    /// Only spontaneous ignition can start a fire
    Spontaneous,
}

/// Which trees of a starter-stage run have spontaneous ignition suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarterSuppression {
    /// Only trees lit at tick 0
    #[default]
    SeededCells,
    /// Every tree of the run
    WholeRun,
}

impl FromStr for StarterSuppression {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "seeded_cells" | "seeded" => Ok(StarterSuppression::SeededCells),
            "whole_run" | "all" => Ok(StarterSuppression::WholeRun),
            other => Err(SimulationError::invalid(format!(
                "unknown starter suppression '{other}' (expected seeded-cells or whole-run)"
            ))),
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of rows
    pub height: usize,
    /// Number of columns
    pub width: usize,
    /// Probability that a position holds a tree, in `[0, 1]`
    pub density: f64,
    /// Initial flamability distribution
    pub distribution: FlamabilityDistribution,
    /// Light the left column at tick 0
    pub start_cells: bool,
    /// Light trees probabilistically at tick 0 (ignored when `start_cells` is set)
    pub start_stage: bool,
    /// Seed of the run's pseudorandom generator
    pub seed: u64,
    /// Number of ticks before the run finishes
    pub horizon: u32,
    /// Per-tick flamability growth for non-constant distributions
    pub growth_rate: f64,
    /// Neighbour ignition formula
    pub spread_model: SpreadModel,
    /// Starter-stage spontaneous ignition suppression scope
    pub starter_suppression: StarterSuppression,
}

impl Default for SimulationConfig {
    /// 100 × 100 forest at 65% density, uniform flamability, left edge lit.
    fn default() -> Self {
        Self {
            height: 100,
            width: 100,
            density: 0.65,
            distribution: FlamabilityDistribution::Uniform,
            start_cells: true,
            start_stage: false,
            seed: 0,
            horizon: DEFAULT_HORIZON,
            growth_rate: DEFAULT_GROWTH_RATE,
            spread_model: SpreadModel::Compounding,
            starter_suppression: StarterSuppression::SeededCells,
        }
    }
}

impl SimulationConfig {
    /// Configuration with the given grid and density and reference defaults otherwise.
    #[must_use]
    pub fn new(
        height: usize,
        width: usize,
        density: f64,
        distribution: FlamabilityDistribution,
    ) -> Self {
        Self {
            height,
            width,
            density,
            distribution,
            ..Default::default()
        }
    }

    /// Set both seeding flags.
    pub fn with_seeding(mut self, start_cells: bool, start_stage: bool) -> Self {
        self.start_cells = start_cells;
        self.start_stage = start_stage;
        self
    }

    /// Set the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the run length.
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the flamability growth rate.
    pub fn with_growth_rate(mut self, growth_rate: f64) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    /// Set the neighbour ignition formula.
    pub fn with_spread_model(mut self, spread_model: SpreadModel) -> Self {
        self.spread_model = spread_model;
        self
    }

    /// Set the starter-stage suppression scope.
    pub fn with_starter_suppression(mut self, suppression: StarterSuppression) -> Self {
        self.starter_suppression = suppression;
        self
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidConfiguration`] if the grid is empty
    /// or too large to allocate, the density is not within `[0, 1]`, or the
    /// growth rate is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(SimulationError::invalid("height must be positive, got 0"));
        }
        if self.width == 0 {
            return Err(SimulationError::invalid("width must be positive, got 0"));
        }
        // One `Option<Cell>` slot per position; a Vec may not exceed isize::MAX bytes
        let bytes = self
            .height
            .checked_mul(self.width)
            .and_then(|positions| positions.checked_mul(std::mem::size_of::<Option<Cell>>()));
        if !bytes.is_some_and(|b| isize::try_from(b).is_ok()) {
            return Err(SimulationError::invalid(format!(
                "grid of {} x {} positions is too large",
                self.height, self.width
            )));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(SimulationError::invalid(format!(
                "density must be within [0, 1], got {}",
                self.density
            )));
        }
        if !self.growth_rate.is_finite() || self.growth_rate < 0.0 {
            return Err(SimulationError::invalid(format!(
                "growth rate must be finite and non-negative, got {}",
                self.growth_rate
            )));
        }
        Ok(())
    }

    /// Seeding policy implied by the two flags. `start_cells` wins.
    pub fn seeding(&self) -> IgnitionSeeding {
        if self.start_cells {
            IgnitionSeeding::LeftEdge
        } else if self.start_stage {
            IgnitionSeeding::StarterStage
        } else {
            IgnitionSeeding::Spontaneous
        }
    }

    /// Growth rate actually applied; constant flamability never grows.
    pub fn effective_growth_rate(&self) -> f64 {
        if self.distribution.is_constant() {
            0.0
        } else {
            self.growth_rate
        }
    }

    /// Per-tick transition parameters for this run.
    pub fn transition_rules(&self) -> TransitionRules {
        TransitionRules::new(self.spread_model, self.effective_growth_rate(), self.horizon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 90);
        assert_eq!(config.seeding(), IgnitionSeeding::LeftEdge);
    }

    #[test]
    fn test_rejects_bad_density() {
        for density in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig::new(10, 10, density, FlamabilityDistribution::Uniform);
            assert!(
                matches!(config.validate(), Err(SimulationError::InvalidConfiguration(_))),
                "density {density} accepted"
            );
        }
        for density in [0.0, 1.0] {
            let config = SimulationConfig::new(10, 10, density, FlamabilityDistribution::Uniform);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config = SimulationConfig::new(0, 10, 0.5, FlamabilityDistribution::Normal);
        assert!(config.validate().is_err());
        let config = SimulationConfig::new(10, 0, 0.5, FlamabilityDistribution::Normal);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_grid_too_large_to_allocate() {
        // 2^62 positions fit in usize but their slots do not fit in memory
        let config = SimulationConfig::new(1 << 31, 1 << 31, 0.0, FlamabilityDistribution::Uniform);
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            crate::Simulation::new(config),
            Err(SimulationError::InvalidConfiguration(_))
        ));

        let config =
            SimulationConfig::new(usize::MAX, 2, 0.0, FlamabilityDistribution::Uniform);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_growth_rate() {
        let config = SimulationConfig::default().with_growth_rate(-0.01);
        assert!(config.validate().is_err());
        let config = SimulationConfig::default().with_growth_rate(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_seeding_precedence() {
        let config = SimulationConfig::default();
        assert_eq!(
            config.clone().with_seeding(true, true).seeding(),
            IgnitionSeeding::LeftEdge
        );
        assert_eq!(
            config.clone().with_seeding(false, true).seeding(),
            IgnitionSeeding::StarterStage
        );
        assert_eq!(
            config.with_seeding(false, false).seeding(),
            IgnitionSeeding::Spontaneous
        );
    }

    #[test]
    fn test_constant_never_grows() {
        let config = SimulationConfig::new(5, 5, 1.0, FlamabilityDistribution::Constant);
        assert_eq!(config.effective_growth_rate(), 0.0);
        assert_eq!(config.transition_rules().growth_rate, 0.0);
    }

    #[test]
    fn test_parse_starter_suppression() {
        assert_eq!(
            "whole-run".parse::<StarterSuppression>().unwrap(),
            StarterSuppression::WholeRun
        );
        assert_eq!(
            "seeded_cells".parse::<StarterSuppression>().unwrap(),
            StarterSuppression::SeededCells
        );
        assert!("never".parse::<StarterSuppression>().is_err());
    }
}
