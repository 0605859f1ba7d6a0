//! Ensembles of independent runs
//!
//! The model is mostly studied statistically: how much of the forest burns as
//! a function of tree density (a percolation-style threshold), averaged over
//! many seeds. Runs are spread over the rayon pool; each run still steps
//! single-threaded with its own generator, so results do not depend on
//! scheduling.

use super::{History, Simulation, SimulationConfig};
use crate::error::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Averaged outcome of all runs at one density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub density: f64,
    pub runs: usize,
    /// Mean number of trees placed
    pub mean_tree_count: f64,
    /// Mean share of placed trees burned out at the horizon
    pub mean_burned_fraction: f64,
}

#[derive(Debug, Clone, Copy)]
struct RunOutcome {
    tree_count: usize,
    burned_fraction: f64,
}

fn run_once(config: SimulationConfig) -> Result<(History, RunOutcome)> {
    let mut sim = Simulation::new(config)?;
    sim.run_to_horizon();
    let tree_count = sim.tree_count();
    let burned = sim.history().last().map_or(0, |t| t.burned_out_count);
    let burned_fraction = if tree_count == 0 {
        0.0
    } else {
        burned as f64 / tree_count as f64
    };
    let history = sim.history().clone();
    Ok((
        history,
        RunOutcome {
            tree_count,
            burned_fraction,
        },
    ))
}

/// Run `base` once per seed, in parallel, and return each run's history in
/// seed order.
///
/// # Errors
///
/// Returns [`SimulationError::InvalidConfiguration`](crate::SimulationError::InvalidConfiguration)
/// if `base` does not validate.
pub fn run_ensemble(base: &SimulationConfig, seeds: &[u64]) -> Result<Vec<History>> {
    base.validate()?;
    seeds
        .par_iter()
        .map(|&seed| run_once(base.clone().with_seed(seed)).map(|(history, _)| history))
        .collect()
}

/// Run `runs_per_density` seeds at every density and average the outcomes.
///
/// Seeds are `base.seed + i` for the `i`-th run of each density, so every
/// density sees the same seeds.
///
/// # Errors
///
/// Returns [`SimulationError::InvalidConfiguration`](crate::SimulationError::InvalidConfiguration)
/// if `base` or any density does not validate.
pub fn density_sweep(
    base: &SimulationConfig,
    densities: &[f64],
    runs_per_density: usize,
) -> Result<Vec<SweepPoint>> {
    let configs: Vec<SimulationConfig> = densities
        .iter()
        .flat_map(|&density| {
            (0..runs_per_density).map(move |i| SimulationConfig {
                density,
                seed: base.seed.wrapping_add(i as u64),
                ..base.clone()
            })
        })
        .collect();
    for config in &configs {
        config.validate()?;
    }

    info!(
        densities = densities.len(),
        runs_per_density,
        total_runs = configs.len(),
        "starting density sweep"
    );

    let outcomes: Vec<RunOutcome> = configs
        .into_par_iter()
        .map(|config| run_once(config).map(|(_, outcome)| outcome))
        .collect::<Result<_>>()?;

    Ok(densities
        .iter()
        .enumerate()
        .map(|(i, &density)| {
            let start = i * runs_per_density;
            let chunk = &outcomes[start..start + runs_per_density];
            let runs = chunk.len();
            let (mean_tree_count, mean_burned_fraction) = if runs == 0 {
                (0.0, 0.0)
            } else {
                let trees: usize = chunk.iter().map(|o| o.tree_count).sum();
                let burned: f64 = chunk.iter().map(|o| o.burned_fraction).sum();
                (trees as f64 / runs as f64, burned / runs as f64)
            };
            SweepPoint {
                density,
                runs,
                mean_tree_count,
                mean_burned_fraction,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::FlamabilityDistribution;
    use crate::SimulationError;

    fn base() -> SimulationConfig {
        SimulationConfig::new(15, 15, 0.6, FlamabilityDistribution::Uniform).with_horizon(20)
    }

    #[test]
    fn test_ensemble_matches_sequential_runs() {
        let seeds = [1, 2, 3, 4];
        let parallel = run_ensemble(&base(), &seeds).unwrap();
        assert_eq!(parallel.len(), 4);
        for (history, &seed) in parallel.iter().zip(&seeds) {
            let mut sim = Simulation::new(base().with_seed(seed)).unwrap();
            assert_eq!(history, sim.run_to_horizon());
        }
    }

    #[test]
    fn test_ensemble_rejects_invalid_base() {
        let bad = SimulationConfig {
            density: -1.0,
            ..base()
        };
        assert!(matches!(
            run_ensemble(&bad, &[1]),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_sweep_shape_and_extremes() {
        let points = density_sweep(&base(), &[0.0, 1.0], 3).unwrap();
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].runs, 3);
        assert_eq!(points[0].mean_tree_count, 0.0);
        assert_eq!(points[0].mean_burned_fraction, 0.0);

        assert_eq!(points[1].mean_tree_count, 225.0);
        assert!(points[1].mean_burned_fraction > 0.0);
        assert!(points[1].mean_burned_fraction <= 1.0);
    }

    #[test]
    fn test_sweep_rejects_bad_density() {
        assert!(density_sweep(&base(), &[0.5, 1.5], 2).is_err());
    }
}
