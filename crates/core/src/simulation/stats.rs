//! Per-tick statistics, run history and spatial snapshots
//!
//! These are the read-only values handed to whatever reports on a run.

use crate::core_types::FireState;
use crate::grid::ForestGrid;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Snapshot value of an empty position.
pub const SNAPSHOT_EMPTY: f64 = 0.0;
/// Snapshot value of a burned-out tree.
pub const SNAPSHOT_BURNED_OUT: f64 = -1.0;
/// Snapshot value of a burning tree.
pub const SNAPSHOT_ON_FIRE: f64 = 2.0;

/// Aggregate counts after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickStats {
    /// Tick the counts were taken after (0 = right after construction)
    pub tick: u32,
    pub fine_count: usize,
    pub on_fire_count: usize,
    pub burned_out_count: usize,
    /// Mean flamability over fine trees, 0 when none are left
    pub mean_flamability_of_fine: f64,
}

impl TickStats {
    /// Count the grid as it stands.
    pub fn from_grid(grid: &ForestGrid, tick: u32) -> Self {
        let mut stats = TickStats {
            tick,
            ..Default::default()
        };
        let mut flamability_sum = 0.0;

        for cell in grid.cells() {
            match cell.state() {
                FireState::Fine => {
                    stats.fine_count += 1;
                    flamability_sum += cell.flamability();
                }
                FireState::OnFire => stats.on_fire_count += 1,
                FireState::BurnedOut => stats.burned_out_count += 1,
            }
        }

        if stats.fine_count > 0 {
            stats.mean_flamability_of_fine = flamability_sum / stats.fine_count as f64;
        }
        stats
    }

    /// Number of trees counted.
    pub fn total(&self) -> usize {
        self.fine_count + self.on_fire_count + self.burned_out_count
    }
}

/// Time series accumulated over a run, one entry per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub burned_out_per_tick: Vec<usize>,
    pub mean_flamability_per_tick: Vec<f64>,
    /// Full counts for every tick
    pub ticks: Vec<TickStats>,
}

impl History {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            burned_out_per_tick: Vec::with_capacity(capacity),
            mean_flamability_per_tick: Vec::with_capacity(capacity),
            ticks: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn record(&mut self, stats: TickStats) {
        self.burned_out_per_tick.push(stats.burned_out_count);
        self.mean_flamability_per_tick
            .push(stats.mean_flamability_of_fine);
        self.ticks.push(stats);
    }

    /// Number of ticks recorded.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether no tick has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Most recent tick.
    pub fn last(&self) -> Option<&TickStats> {
        self.ticks.last()
    }
}

/// Grid-shaped picture of a run at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u32,
    /// `height × width` (row = y, column = x): -1 burned out, 2 on fire,
    /// clamped flamability when fine, 0 when empty
    pub grid: DMatrix<f64>,
    /// Flamability of every fine tree, row-major
    pub fine_flamabilities: Vec<f64>,
}

impl Snapshot {
    /// Picture the grid as it stands.
    pub fn from_grid(grid: &ForestGrid, tick: u32) -> Self {
        let mut matrix = DMatrix::from_element(grid.height(), grid.width(), SNAPSHOT_EMPTY);
        let mut fine_flamabilities = Vec::new();

        for cell in grid.cells() {
            let p = cell.position();
            matrix[(p.y, p.x)] = match cell.state() {
                FireState::BurnedOut => SNAPSHOT_BURNED_OUT,
                FireState::OnFire => SNAPSHOT_ON_FIRE,
                FireState::Fine => {
                    fine_flamabilities.push(cell.flamability());
                    cell.effective_flamability()
                }
            };
        }

        Self {
            tick,
            grid: matrix,
            fine_flamabilities,
        }
    }

    /// Value at column `x`, row `y`.
    pub fn value_at(&self, x: usize, y: usize) -> Option<f64> {
        self.grid.get((y, x)).copied()
    }

    /// Counts of fine-tree flamability in `bins` equal bins over `[0, 1]`.
    pub fn flamability_histogram(&self, bins: usize) -> Vec<usize> {
        let mut counts = vec![0; bins];
        if bins == 0 {
            return counts;
        }
        for &f in &self.fine_flamabilities {
            let bin = ((f.clamp(0.0, 1.0) * bins as f64) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        counts
    }
}
