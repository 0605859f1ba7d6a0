//! Random-order step scheduler
//!
//! One tick visits every tree exactly once, in a fresh uniform permutation of
//! the occupied positions. A tree lit earlier in the tick by another tree's
//! step acts as a fire source if it is visited later in the same tick, so fire
//! can travel more than one hop per tick depending on the draw.

use super::stats::{History, TickStats};
use crate::core_types::TransitionRules;
use crate::grid::ForestGrid;
use rand::seq::SliceRandom;
use rand::Rng;

/// Advances a [`ForestGrid`] one tick at a time.
#[derive(Debug, Clone, Default)]
pub struct StepScheduler {
    /// Visit order of the last tick, reused between ticks
    order: Vec<usize>,
}

impl StepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step every tree once, then count the grid and append the counts to `history`.
    ///
    /// Draw order: one permutation, then each visited tree's rolls.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        grid: &mut ForestGrid,
        history: &mut History,
        rules: &TransitionRules,
        tick: u32,
        rng: &mut R,
    ) -> TickStats {
        self.order.clear();
        self.order.extend_from_slice(grid.occupied_indices());
        self.order.shuffle(rng);

        for &index in &self.order {
            grid.step_cell(index, rules, rng);
        }

        let stats = TickStats::from_grid(grid, tick);
        history.record(stats);
        stats
    }

    /// Flat indices in the order the last tick visited them.
    pub fn last_order(&self) -> &[usize] {
        &self.order
    }
}
