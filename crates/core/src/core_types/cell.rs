//! Tree cell state machine
//!
//! A cell is one tree on the forest grid. Each tick it runs exactly one
//! transition ([`Cell::step`]):
//!
//! 1. A burning tree exposes every fine neighbour (pressure +1, then an
//!    ignition roll) and burns out.
//! 2. A fine tree that was not seeded in the starter stage may ignite
//!    spontaneously with a small, flamability-proportional probability.
//! 3. Otherwise nothing happens.
//!
//! Afterwards every tree that has not burned out grows its flamability
//! (fuel drying) and clamps it to 1. Burned-out trees are frozen.
//!
//! The exposure roll compounds with accumulated pressure:
//! ```text
//! P(ignite) = 1 - (1 - min(f, 1))^min(pressure, 8)
//! ```

use super::flamability::FlamabilitySampler;
use crate::error::{Result, SimulationError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Pressure cap applied inside the compounding ignition formula only.
pub const MAX_EFFECTIVE_PRESSURE: u32 = 8;

/// Per-exposure increment of the legacy linear ignition formula.
pub const LINEAR_PRESSURE_WEIGHT: f64 = 0.125;

/// Integer grid coordinate of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, 0 is the left edge
    pub x: usize,
    /// Row
    pub y: usize,
}

impl Position {
    /// Create a position from column and row.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// Fire state of a tree. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FireState {
    /// Unburnt
    #[default]
    Fine,
    /// Burning this tick; spreads on its next step and then burns out
    OnFire,
    /// Terminal
    BurnedOut,
}

impl fmt::Display for FireState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FireState::Fine => "Fine",
            FireState::OnFire => "On Fire",
            FireState::BurnedOut => "Burned Out",
        })
    }
}

/// Ignition probability model for neighbour exposure.
///
/// The two are alternatives and are never mixed within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadModel {
    /// `1 - (1 - f)^min(pressure, 8)` plus spontaneous ignition
    #[default]
    Compounding,
    /// Legacy `f + 0.125 * pressure`, uncapped, no spontaneous ignition
    Linear,
}

impl FromStr for SpreadModel {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compounding" => Ok(SpreadModel::Compounding),
            "linear" => Ok(SpreadModel::Linear),
            other => Err(SimulationError::invalid(format!(
                "unknown spread model '{other}' (expected compounding or linear)"
            ))),
        }
    }
}

/// Run-wide parameters of the per-tick transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRules {
    /// Neighbour ignition formula
    pub spread_model: SpreadModel,
    /// Multiplicative flamability growth per tick (0 pins flamability)
    pub growth_rate: f64,
    /// Spontaneous ignition probability per unit flamability per tick
    pub spontaneous_rate: f64,
}

impl TransitionRules {
    /// Derive the rules for a run of `horizon` ticks.
    ///
    /// The spontaneous rate spreads one expected ignition per 100 units of
    /// flamability over the whole horizon: `1 / (horizon * 100)`, i.e.
    /// `f / 9000` for the reference 90-tick run.
    pub fn new(spread_model: SpreadModel, growth_rate: f64, horizon: u32) -> Self {
        let spontaneous_rate = if horizon == 0 {
            0.0
        } else {
            1.0 / (f64::from(horizon) * 100.0)
        };
        Self {
            spread_model,
            growth_rate,
            spontaneous_rate,
        }
    }

    /// Probability that a fine tree with flamability `flamability` and
    /// `pressure` accumulated exposures catches fire from a burning neighbour.
    pub fn exposure_probability(&self, flamability: f64, pressure: u32) -> f64 {
        let f = flamability.min(1.0);
        match self.spread_model {
            SpreadModel::Compounding => {
                let exponent = pressure.min(MAX_EFFECTIVE_PRESSURE) as i32;
                1.0 - (1.0 - f).powi(exponent)
            }
            SpreadModel::Linear => f + LINEAR_PRESSURE_WEIGHT * f64::from(pressure),
        }
    }

    /// Probability of spontaneous ignition for a tree with `flamability`, if
    /// the model allows it at all.
    pub fn spontaneous_probability(&self, flamability: f64) -> Option<f64> {
        match self.spread_model {
            SpreadModel::Compounding => Some(flamability.min(1.0) * self.spontaneous_rate),
            SpreadModel::Linear => None,
        }
    }
}

/// A single tree on the forest grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    position: Position,
    state: FireState,
    flamability: f64,
    neighbor_fire_pressure: u32,
    ignited_before_start: bool,
}

impl Cell {
    /// Create a fine tree with an explicit flamability.
    pub fn new(position: Position, flamability: f64, ignited_before_start: bool) -> Self {
        Self {
            position,
            state: FireState::Fine,
            flamability,
            neighbor_fire_pressure: 0,
            ignited_before_start,
        }
    }

    /// Create a fine tree with flamability drawn from `sampler`.
    pub fn initialize<R: Rng + ?Sized>(
        position: Position,
        sampler: &FlamabilitySampler,
        ignited_before_start: bool,
        rng: &mut R,
    ) -> Self {
        Self::new(position, sampler.sample(rng), ignited_before_start)
    }

    /// Grid coordinate.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Current fire state.
    pub fn state(&self) -> FireState {
        self.state
    }

    /// Raw flamability (at most 1 outside of a step).
    pub fn flamability(&self) -> f64 {
        self.flamability
    }

    /// Flamability as read by every probability computation.
    pub fn effective_flamability(&self) -> f64 {
        self.flamability.min(1.0)
    }

    /// Number of burning-neighbour exposures so far.
    pub fn neighbor_fire_pressure(&self) -> u32 {
        self.neighbor_fire_pressure
    }

    /// Whether spontaneous ignition is suppressed for this tree.
    pub fn ignited_before_start(&self) -> bool {
        self.ignited_before_start
    }

    /// Whether the tree is fine.
    pub fn is_fine(&self) -> bool {
        self.state == FireState::Fine
    }

    /// Set a fine tree on fire. No effect on burning or burned trees.
    pub fn ignite(&mut self) {
        if self.state == FireState::Fine {
            self.state = FireState::OnFire;
        }
    }

    pub(crate) fn set_ignited_before_start(&mut self, flag: bool) {
        self.ignited_before_start = flag;
    }

    /// Advance this tree by one tick.
    ///
    /// `neighbors` are the trees adjacent to this one. Only burning trees touch
    /// them; for any other state the iterator is never consumed.
    pub fn step<'n, I, R>(&mut self, neighbors: I, rules: &TransitionRules, rng: &mut R)
    where
        I: IntoIterator<Item = &'n mut Cell>,
        R: Rng + ?Sized,
    {
        match self.state {
            FireState::OnFire => {
                for neighbor in neighbors {
                    if neighbor.is_fine() && neighbor.expose_to_fire(rules, rng) {
                        neighbor.state = FireState::OnFire;
                    }
                }
                self.state = FireState::BurnedOut;
                return;
            }
            FireState::Fine if !self.ignited_before_start => {
                if let Some(p) = rules.spontaneous_probability(self.flamability) {
                    if rng.random::<f64>() < p {
                        trace!(x = self.position.x, y = self.position.y, "spontaneous ignition");
                        self.state = FireState::OnFire;
                    }
                }
            }
            FireState::Fine => {}
            FireState::BurnedOut => return,
        }
        self.variate_flamability(rules.growth_rate);
    }

    /// Record one exposure to a burning neighbour and roll for ignition.
    fn expose_to_fire<R: Rng + ?Sized>(&mut self, rules: &TransitionRules, rng: &mut R) -> bool {
        self.neighbor_fire_pressure = self.neighbor_fire_pressure.saturating_add(1);
        let p = rules.exposure_probability(self.flamability, self.neighbor_fire_pressure);
        rng.random::<f64>() < p
    }

    fn variate_flamability(&mut self, growth_rate: f64) {
        self.flamability *= 1.0 + growth_rate;
        if self.flamability > 1.0 {
            self.flamability = 1.0;
        }
    }
}
