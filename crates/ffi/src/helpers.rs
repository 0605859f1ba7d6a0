use crate::error::{
    with_last_error_mut, DefaultForestFireError, ForestFireError, ForestFireErrorCode,
};
use crate::instance::ForestFireInstance;
use forest_fire_core::Simulation;
use std::ffi::CString;

/// Set the thread-local error message and code.
/// Accepts any type implementing `ForestFireError` trait.
pub(crate) fn set_last_error(error: &impl ForestFireError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl ForestFireError) -> ForestFireErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = ForestFireErrorCode::Ok;
    });
}

/// Record the outcome of a fallible operation and reduce it to an error code.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultForestFireError>,
) -> Result<T, ForestFireErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Run `f` and convert its result to the code returned across the boundary.
pub(crate) fn handle_ffi_result_error<F>(f: F) -> ForestFireErrorCode
where
    F: FnOnce() -> Result<(), DefaultForestFireError>,
{
    match track_result(f()) {
        Ok(()) => ForestFireErrorCode::Ok,
        Err(code) => code,
    }
}

/// Borrow an instance from a raw pointer.
///
/// # Safety
/// `ptr` must be null or a pointer returned by `forest_fire_run` that has not
/// been destroyed.
pub(crate) unsafe fn instance_from_ptr<'a>(
    ptr: *const ForestFireInstance,
) -> Result<&'a ForestFireInstance, DefaultForestFireError> {
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultForestFireError::null_pointer("ptr"))
}

/// Run `f` with shared access to the simulation.
pub(crate) fn with_simulation<F, T>(
    instance: &ForestFireInstance,
    f: F,
) -> Result<T, DefaultForestFireError>
where
    F: FnOnce(&Simulation) -> T,
{
    let sim = instance
        .sim
        .read()
        .map_err(|_| DefaultForestFireError::lock_poisoned("RwLock"))?;
    Ok(f(&sim))
}

/// Run `f` with exclusive access to the simulation.
pub(crate) fn with_simulation_mut<F, T>(
    instance: &ForestFireInstance,
    f: F,
) -> Result<T, DefaultForestFireError>
where
    F: FnOnce(&mut Simulation) -> T,
{
    let mut sim = instance
        .sim
        .write()
        .map_err(|_| DefaultForestFireError::lock_poisoned("RwLock"))?;
    Ok(f(&mut sim))
}
