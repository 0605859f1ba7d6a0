use forest_fire_core::{Simulation, TickStats};
use std::ptr;
use std::slice;

use crate::error::{DefaultForestFireError, ForestFireErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_simulation};
use crate::instance::ForestFireInstance;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
/// FFI-friendly copy of the statistics recorded for one tick.
/// Keep this layout stable for C/C++ consumers.
pub struct ForestFireTickStats {
    /// Tick the statistics were taken at (0 for the initial state).
    pub tick: u32,

    /// Trees that have not caught fire.
    pub fine_count: usize,

    /// Trees burning during this tick.
    pub on_fire_count: usize,

    /// Trees that have finished burning.
    pub burned_out_count: usize,

    /// Mean flamability over Fine trees, 0 when there are none.
    pub mean_flamability_of_fine: f64,
}

impl From<&TickStats> for ForestFireTickStats {
    fn from(stats: &TickStats) -> Self {
        Self {
            tick: stats.tick,
            fine_count: stats.fine_count,
            on_fire_count: stats.on_fire_count,
            burned_out_count: stats.burned_out_count,
            mean_flamability_of_fine: stats.mean_flamability_of_fine,
        }
    }
}

#[no_mangle]
/// Fill `out_stats` with the statistics of the forest as planted, before tick 1.
///
/// Returns
/// - `ForestFireErrorCode::Ok` (0) on success
/// - `ForestFireErrorCode::NullPointer` if `ptr` or `out_stats` is null
/// - `ForestFireErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `forest_fire_run` or null.
/// - `out_stats` must be a valid, non-null pointer to a `ForestFireTickStats`.
pub unsafe extern "C" fn forest_fire_initial_stats(
    ptr: *const ForestFireInstance,
    out_stats: *mut ForestFireTickStats,
) -> ForestFireErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultForestFireError::null_pointer("out_stats"));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let stats = with_simulation(instance, Simulation::initial_stats)?;
        unsafe {
            *out_stats = ForestFireTickStats::from(&stats);
        }
        Ok::<(), DefaultForestFireError>(())
    })
}

#[no_mangle]
/// Return a borrowed pointer to the current grid snapshot in row-major order.
///
/// Each value is `0` for an empty position, `-1` for a burned-out tree, `2` for a
/// burning tree, or the tree's flamability in `[0, 1]` for a Fine tree. The value
/// of column `x` in row `y` is at index `y * width + x`.
///
/// **PERFORMANCE & THREAD SAFETY**: the values live in a buffer owned by the
/// instance and reused between calls, guarded by a `Mutex`.
///
/// - **DO NOT FREE** the pointer written to `out_values`.
/// - It is invalidated by the next call to `forest_fire_snapshot` or by
///   `forest_fire_destroy`.
///
/// Returns
/// - `ForestFireErrorCode::Ok` (0) on success
/// - `ForestFireErrorCode::NullPointer` if any argument is null; outputs are
///   zeroed/nulled where writable
/// - `ForestFireErrorCode::LockPoisoned` if an internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `forest_fire_run` or null.
/// - `out_width`, `out_height` and `out_values` must be valid, non-null pointers.
///
/// # Example Usage (C)
/// ```c
/// uintptr_t width = 0, height = 0;
/// const double* values = NULL;
/// if (forest_fire_snapshot(sim, &width, &height, &values) == Ok) {
///     double corner = values[(height - 1) * width + (width - 1)];
/// }
/// ```
pub unsafe extern "C" fn forest_fire_snapshot(
    ptr: *const ForestFireInstance,
    out_width: *mut usize,
    out_height: *mut usize,
    out_values: *mut *const f64,
) -> ForestFireErrorCode {
    if out_width.is_null() || out_height.is_null() || out_values.is_null() {
        unsafe {
            if let Some(width) = out_width.as_mut() {
                *width = 0;
            }
            if let Some(height) = out_height.as_mut() {
                *height = 0;
            }
            if let Some(values) = out_values.as_mut() {
                *values = ptr::null();
            }
        }
        return track_error(&DefaultForestFireError::null_pointer(
            "out_width, out_height or out_values",
        ));
    }

    let result = handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let mut cache = instance
            .snapshot_cache
            .lock()
            .map_err(|_| DefaultForestFireError::lock_poisoned("Mutex"))?;
        cache.clear();

        let (width, height) = with_simulation(instance, |sim| {
            let snapshot = sim.snapshot();
            // Transposing the column-major (y, x) matrix yields row-major storage
            cache.extend(snapshot.grid.transpose().iter());
            (snapshot.grid.ncols(), snapshot.grid.nrows())
        })?;

        unsafe {
            *out_width = width;
            *out_height = height;
            *out_values = cache.as_ptr();
        }
        Ok::<(), DefaultForestFireError>(())
    });

    if result != ForestFireErrorCode::Ok {
        unsafe {
            *out_width = 0;
            *out_height = 0;
            *out_values = ptr::null();
        }
    }

    result
}

#[no_mangle]
/// Number of ticks recorded in the run's history. Returns 0 if `ptr` is null.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `forest_fire_run` or null.
pub unsafe extern "C" fn forest_fire_history_len(ptr: *const ForestFireInstance) -> usize {
    let mut len = 0;
    let _ = handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        len = with_simulation(instance, |sim| sim.history().len())?;
        Ok::<(), DefaultForestFireError>(())
    });
    len
}

#[no_mangle]
/// Copy the run's history into caller-owned buffers.
///
/// Entry `i` of each buffer holds the value recorded after tick `i + 1`:
/// the burned-out count and the mean flamability of Fine trees. Use
/// `forest_fire_history_len` to size the buffers.
///
/// Returns
/// - `ForestFireErrorCode::Ok` (0) on success, `out_len` holds the number of entries written
/// - `ForestFireErrorCode::NullPointer` if any pointer is null
/// - `ForestFireErrorCode::InvalidParameter` if `capacity` is smaller than the history
/// - `ForestFireErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `forest_fire_run` or null.
/// - `out_burned_out` and `out_mean_flamability` must each point to at least
///   `capacity` writable elements.
/// - `out_len` must be a valid, non-null pointer.
pub unsafe extern "C" fn forest_fire_history(
    ptr: *const ForestFireInstance,
    out_burned_out: *mut usize,
    out_mean_flamability: *mut f64,
    capacity: usize,
    out_len: *mut usize,
) -> ForestFireErrorCode {
    if out_len.is_null() {
        return track_error(&DefaultForestFireError::null_pointer("out_len"));
    }
    unsafe {
        *out_len = 0;
    }
    if out_burned_out.is_null() {
        return track_error(&DefaultForestFireError::null_pointer("out_burned_out"));
    }
    if out_mean_flamability.is_null() {
        return track_error(&DefaultForestFireError::null_pointer("out_mean_flamability"));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_simulation(instance, |sim| {
            let history = sim.history();
            let len = history.len();
            if capacity < len {
                return Err(DefaultForestFireError::invalid_parameter(format!(
                    "history holds {len} ticks but capacity is {capacity}"
                )));
            }

            // SAFETY: caller guarantees both buffers hold `capacity >= len` elements.
            let burned = unsafe { slice::from_raw_parts_mut(out_burned_out, len) };
            let mean = unsafe { slice::from_raw_parts_mut(out_mean_flamability, len) };
            burned.copy_from_slice(&history.burned_out_per_tick);
            mean.copy_from_slice(&history.mean_flamability_per_tick);
            unsafe {
                *out_len = len;
            }
            Ok(())
        })?
    })
}
