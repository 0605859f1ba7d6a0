//! Property tests for per-tree invariants over arbitrary small runs

use forest_fire_core::{
    Cell, FireState, FlamabilityDistribution, Position, Simulation, SimulationConfig, SpreadModel,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn distribution() -> impl Strategy<Value = FlamabilityDistribution> {
    prop_oneof![
        Just(FlamabilityDistribution::Uniform),
        Just(FlamabilityDistribution::Normal),
        Just(FlamabilityDistribution::Bimodal),
        Just(FlamabilityDistribution::Constant),
    ]
}

fn spread_model() -> impl Strategy<Value = SpreadModel> {
    prop_oneof![Just(SpreadModel::Compounding), Just(SpreadModel::Linear)]
}

prop_compose! {
    fn small_config()(
        height in 1usize..12,
        width in 1usize..12,
        density in 0.0f64..=1.0,
        distribution in distribution(),
        start_cells in any::<bool>(),
        start_stage in any::<bool>(),
        seed in any::<u64>(),
        horizon in 0u32..25,
        spread_model in spread_model(),
    ) -> SimulationConfig {
        SimulationConfig::new(height, width, density, distribution)
            .with_seeding(start_cells, start_stage)
            .with_seed(seed)
            .with_horizon(horizon)
            .with_spread_model(spread_model)
    }
}

fn by_position(sim: &Simulation) -> HashMap<Position, Cell> {
    sim.grid().cells().map(|c| (c.position(), c.clone())).collect()
}

fn state_rank(state: FireState) -> u8 {
    match state {
        FireState::Fine => 0,
        FireState::OnFire => 1,
        FireState::BurnedOut => 2,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn per_tick_invariants_hold(config in small_config()) {
        let constant = config.distribution.is_constant();
        let mut sim = Simulation::new(config).unwrap();
        let trees = sim.tree_count();
        let mut before = by_position(&sim);

        while sim.is_running() {
            let stats = sim.advance_tick().unwrap();
            prop_assert_eq!(stats.total(), trees);
            let after = by_position(&sim);
            prop_assert_eq!(after.len(), before.len());

            for (position, old) in &before {
                let new = &after[position];
                prop_assert!((0.0..=1.0).contains(&new.flamability()));
                prop_assert!(state_rank(new.state()) >= state_rank(old.state()));
                prop_assert!(new.neighbor_fire_pressure() >= old.neighbor_fire_pressure());

                if old.state() == FireState::BurnedOut {
                    prop_assert_eq!(new.state(), FireState::BurnedOut);
                    prop_assert_eq!(new.flamability(), old.flamability());
                }
                if old.state() == FireState::Fine && new.state() == FireState::Fine {
                    prop_assert!(new.flamability() >= old.flamability());
                }
                if constant {
                    prop_assert_eq!(new.flamability(), 1.0);
                }
            }
            before = after;
        }
        prop_assert_eq!(sim.history().len(), sim.config().horizon as usize);
    }

    #[test]
    fn runs_are_reproducible(config in small_config()) {
        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config).unwrap();
        prop_assert_eq!(a.run_to_horizon(), b.run_to_horizon());
    }

    #[test]
    fn out_of_range_density_is_rejected(density in prop_oneof![-10.0f64..-1e-9, 1.000_001f64..10.0]) {
        let config = SimulationConfig::new(5, 5, density, FlamabilityDistribution::Uniform);
        prop_assert!(Simulation::new(config).is_err());
    }
}
