//! C ABI for the forest fire simulation.
//!
//! A run is created with `forest_fire_run`, driven with
//! `forest_fire_advance_tick`, inspected through the snapshot and history
//! queries, and released with `forest_fire_destroy`. Every fallible function
//! returns a `ForestFireErrorCode`; the matching message is available from
//! `forest_fire_get_last_error` on the same thread.

mod error;
mod helpers;
mod instance;
mod queries;
mod simulation;

pub use error::{forest_fire_get_last_error, forest_fire_get_last_error_code, ForestFireErrorCode};
pub use instance::{
    forest_fire_default_config, forest_fire_destroy, forest_fire_run, ForestFireConfig,
    ForestFireInstance,
};
pub use queries::{
    forest_fire_history, forest_fire_history_len, forest_fire_initial_stats,
    forest_fire_snapshot, ForestFireTickStats,
};
pub use simulation::{forest_fire_advance_tick, forest_fire_get_tick, forest_fire_is_running};
