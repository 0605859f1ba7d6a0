use forest_fire_core::Simulation;

use crate::error::{DefaultForestFireError, ForestFireErrorCode};
use crate::helpers::{
    handle_ffi_result_error, instance_from_ptr, with_simulation, with_simulation_mut,
};
use crate::instance::ForestFireInstance;
use crate::queries::ForestFireTickStats;

/// Advance the run by one tick.
///
/// Thread-safe: acquires the `RwLock` write lock for the tick.
///
/// Returns
/// - `ForestFireErrorCode::Ok` (0) on success; `out_stats`, if non-null, receives
///   the statistics recorded for the tick
/// - `ForestFireErrorCode::NullPointer` if `ptr` is null
/// - `ForestFireErrorCode::SimulationFinished` if the run already reached its horizon
/// - `ForestFireErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `forest_fire_run` or null.
/// - `out_stats`, if non-null, must point to writable memory for one `ForestFireTickStats`.
#[no_mangle]
pub unsafe extern "C" fn forest_fire_advance_tick(
    ptr: *const ForestFireInstance,
    out_stats: *mut ForestFireTickStats,
) -> ForestFireErrorCode {
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let stats = with_simulation_mut(instance, Simulation::advance_tick)??;

        if !out_stats.is_null() {
            unsafe {
                *out_stats = ForestFireTickStats::from(&stats);
            }
        }
        Ok::<(), DefaultForestFireError>(())
    })
}

/// Current tick of the run (0 before the first tick). Returns 0 if `ptr` is null.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `forest_fire_run` or null.
#[no_mangle]
pub unsafe extern "C" fn forest_fire_get_tick(ptr: *const ForestFireInstance) -> u32 {
    let mut tick = 0;
    let _ = handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        tick = with_simulation(instance, Simulation::tick)?;
        Ok::<(), DefaultForestFireError>(())
    });
    tick
}

/// Whether the run can take another tick. Returns `false` if `ptr` is null.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `forest_fire_run` or null.
#[no_mangle]
pub unsafe extern "C" fn forest_fire_is_running(ptr: *const ForestFireInstance) -> bool {
    let mut running = false;
    let _ = handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        running = with_simulation(instance, Simulation::is_running)?;
        Ok::<(), DefaultForestFireError>(())
    });
    running
}
