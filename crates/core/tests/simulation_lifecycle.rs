//! End-to-end behaviour of complete simulation runs
//!
//! Covers seeding, termination, conservation of trees, the constant and
//! empty-forest regimes, snapshots and seed reproducibility.

use approx::assert_relative_eq;
use ctor::ctor;
use forest_fire_core::simulation::stats::{SNAPSHOT_BURNED_OUT, SNAPSHOT_EMPTY, SNAPSHOT_ON_FIRE};
use forest_fire_core::{
    FireState, FlamabilityDistribution, Phase, Simulation, SimulationConfig, SimulationError,
    SpreadModel,
};
use tracing_subscriber::EnvFilter;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(distribution: FlamabilityDistribution) -> SimulationConfig {
    SimulationConfig::new(40, 40, 0.65, distribution).with_seed(2024)
}

#[test]
fn full_run_reaches_finished_with_one_entry_per_tick() {
    for distribution in FlamabilityDistribution::ALL {
        let mut sim = Simulation::new(config(distribution)).unwrap();
        let history = sim.run_to_horizon().clone();

        assert_eq!(sim.phase(), Phase::Finished, "{distribution}");
        assert_eq!(sim.tick(), 90);
        assert_eq!(history.len(), 90);
        assert_eq!(history.burned_out_per_tick.len(), 90);
        assert_eq!(history.mean_flamability_per_tick.len(), 90);
        assert!(matches!(
            sim.advance_tick(),
            Err(SimulationError::SimulationFinished { horizon: 90 })
        ));
    }
}

#[test]
fn trees_are_conserved_and_burning_is_monotonic() {
    for distribution in FlamabilityDistribution::ALL {
        let mut sim = Simulation::new(config(distribution)).unwrap();
        let trees = sim.tree_count();
        let history = sim.run_to_horizon();

        let mut previous = 0;
        for (i, stats) in history.ticks.iter().enumerate() {
            assert_eq!(stats.tick as usize, i + 1);
            assert_eq!(stats.total(), trees, "tick {} of {distribution}", stats.tick);
            assert!(stats.burned_out_count >= previous);
            previous = stats.burned_out_count;
        }
    }
}

#[test]
fn empty_forest_records_zeros_until_horizon() {
    let mut sim = Simulation::new(
        SimulationConfig::new(25, 25, 0.0, FlamabilityDistribution::Normal).with_seed(1),
    )
    .unwrap();
    assert_eq!(sim.tree_count(), 0);

    for stats in &sim.run_to_horizon().ticks {
        assert_eq!(stats.fine_count, 0);
        assert_eq!(stats.on_fire_count, 0);
        assert_eq!(stats.burned_out_count, 0);
        assert_eq!(stats.mean_flamability_of_fine, 0.0);
    }
    assert_eq!(sim.phase(), Phase::Finished);
    assert!(sim.snapshot().grid.iter().all(|v| *v == SNAPSHOT_EMPTY));
}

#[test]
fn start_cells_lights_exactly_the_left_column() {
    let sim = Simulation::new(
        config(FlamabilityDistribution::Uniform).with_seeding(true, false),
    )
    .unwrap();

    let mut left_column = 0;
    for cell in sim.grid().cells() {
        if cell.position().x == 0 {
            left_column += 1;
            assert_eq!(cell.state(), FireState::OnFire);
        } else {
            assert_ne!(cell.state(), FireState::OnFire);
        }
    }
    assert!(left_column > 0);
    assert_eq!(sim.initial_stats().on_fire_count, left_column);
}

#[test]
fn start_cells_overrides_start_stage() {
    let sim = Simulation::new(config(FlamabilityDistribution::Constant).with_seeding(true, true))
        .unwrap();
    assert!(sim
        .grid()
        .cells()
        .all(|c| (c.state() == FireState::OnFire) == (c.position().x == 0)));
    assert!(sim.grid().cells().all(|c| !c.ignited_before_start()));
}

#[test]
fn starter_stage_without_edge_fire() {
    // Constant flamability makes the starter roll 1/90 per tree
    let sim = Simulation::new(
        SimulationConfig::new(60, 60, 1.0, FlamabilityDistribution::Constant)
            .with_seeding(false, true)
            .with_seed(99),
    )
    .unwrap();

    let lit = sim.initial_stats().on_fire_count;
    // 3600 trees at 1/90 is 40 expected
    assert!((15..=70).contains(&lit), "{lit} trees lit");
    for cell in sim.grid().cells() {
        assert_eq!(cell.ignited_before_start(), cell.state() == FireState::OnFire);
    }
}

#[test]
fn constant_flamability_never_changes() {
    let mut sim = Simulation::new(config(FlamabilityDistribution::Constant)).unwrap();
    while sim.is_running() {
        sim.advance_tick().unwrap();
        assert!(sim.grid().cells().all(|c| c.flamability() == 1.0));
        let stats = sim.history().last().copied().unwrap();
        if stats.fine_count > 0 {
            assert_relative_eq!(stats.mean_flamability_of_fine, 1.0);
        }
    }
}

#[test]
fn constant_dense_forest_burns_completely() {
    let mut sim = Simulation::new(
        SimulationConfig::new(30, 30, 1.0, FlamabilityDistribution::Constant).with_seed(3),
    )
    .unwrap();
    let history = sim.run_to_horizon();
    assert_eq!(history.last().unwrap().burned_out_count, 900);
}

#[test]
fn mean_flamability_of_fine_trees_grows_without_fire() {
    // No seeding and the linear model: nothing can ignite
    let mut sim = Simulation::new(
        config(FlamabilityDistribution::Normal)
            .with_seeding(false, false)
            .with_spread_model(SpreadModel::Linear),
    )
    .unwrap();
    let initial = sim.initial_stats().mean_flamability_of_fine;
    let history = sim.run_to_horizon();

    assert!(history.ticks.iter().all(|t| t.on_fire_count == 0));
    let series = &history.mean_flamability_per_tick;
    assert!(series[0] > initial);
    assert!(series.windows(2).all(|w| w[1] >= w[0]));
    assert_relative_eq!(series[0], initial * 1.02, max_relative = 1e-9);
}

#[test]
fn same_seed_same_history() {
    for distribution in FlamabilityDistribution::ALL {
        let base = config(distribution).with_seeding(false, true);
        let mut a = Simulation::new(base.clone()).unwrap();
        let mut b = Simulation::new(base).unwrap();
        assert_eq!(a.run_to_horizon(), b.run_to_horizon(), "{distribution}");
        assert_eq!(a.snapshot(), b.snapshot());
    }
}

#[test]
fn different_seeds_diverge() {
    let mut a = Simulation::new(config(FlamabilityDistribution::Uniform).with_seed(1)).unwrap();
    let mut b = Simulation::new(config(FlamabilityDistribution::Uniform).with_seed(2)).unwrap();
    assert_ne!(a.run_to_horizon(), b.run_to_horizon());
}

#[test]
fn snapshot_encodes_cell_states() {
    let mut sim = Simulation::new(config(FlamabilityDistribution::Bimodal)).unwrap();
    for _ in 0..3 {
        sim.advance_tick().unwrap();
    }
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.tick, 3);

    for y in 0..40 {
        for x in 0..40 {
            let value = snapshot.value_at(x, y).unwrap();
            match sim.cell(x, y) {
                None => assert_eq!(value, SNAPSHOT_EMPTY),
                Some(cell) => match cell.state() {
                    FireState::BurnedOut => assert_eq!(value, SNAPSHOT_BURNED_OUT),
                    FireState::OnFire => assert_eq!(value, SNAPSHOT_ON_FIRE),
                    FireState::Fine => {
                        assert_eq!(value, cell.flamability().min(1.0));
                        assert!((0.0..=1.0).contains(&value));
                    }
                },
            }
        }
    }

    let stats = sim.history().last().copied().unwrap();
    assert_eq!(snapshot.fine_flamabilities.len(), stats.fine_count);
    assert_eq!(
        snapshot.flamability_histogram(10).iter().sum::<usize>(),
        stats.fine_count
    );
}

#[test]
fn invalid_configurations_never_start() {
    let cases = [
        SimulationConfig::new(0, 10, 0.5, FlamabilityDistribution::Uniform),
        SimulationConfig::new(10, 0, 0.5, FlamabilityDistribution::Uniform),
        SimulationConfig::new(10, 10, -0.5, FlamabilityDistribution::Uniform),
        SimulationConfig::new(10, 10, 1.5, FlamabilityDistribution::Uniform),
    ];
    for config in cases {
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }
    assert!(matches!(
        "triangular".parse::<FlamabilityDistribution>(),
        Err(SimulationError::InvalidConfiguration(_))
    ));
}
