use forest_fire_core::SimulationError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// A failure that can be reported through the C API as a code plus message.
pub(crate) trait ForestFireError {
    fn code(&self) -> ForestFireErrorCode;

    fn msg(&self) -> &str;
}

/// Error raised inside an exported function before it returns to C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultForestFireError {
    code: ForestFireErrorCode,
    msg: String,
}

impl DefaultForestFireError {
    /// `param_name` was null.
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: ForestFireErrorCode::NullPointer,
            msg: format!("null pointer passed for '{param_name}'"),
        }
    }

    /// A thread panicked while holding `lock_name`.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: ForestFireErrorCode::LockPoisoned,
            msg: format!("{lock_name} guarding the run is poisoned"),
        }
    }

    /// `ForestFireConfig` field `field` holds an unusable value.
    pub fn invalid_configuration(field: &str, message: &str) -> Self {
        Self {
            code: ForestFireErrorCode::InvalidConfiguration,
            msg: format!("invalid configuration: {field} {message}"),
        }
    }

    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: ForestFireErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl From<SimulationError> for DefaultForestFireError {
    fn from(error: SimulationError) -> Self {
        let code = match error {
            SimulationError::InvalidConfiguration(_) => ForestFireErrorCode::InvalidConfiguration,
            SimulationError::SimulationFinished { .. } => ForestFireErrorCode::SimulationFinished,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl ForestFireError for DefaultForestFireError {
    fn code(&self) -> ForestFireErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// Status returned by every fallible `forest_fire_*` function. 0 is success.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForestFireErrorCode {
    Ok = 0,

    /// A required pointer argument was null.
    NullPointer = 1,

    /// The instance's lock was poisoned by a panic.
    LockPoisoned = 2,

    /// The run was not created: a `ForestFireConfig` field was rejected.
    InvalidConfiguration = 3,

    /// The run reached its horizon; it takes no further ticks.
    SimulationFinished = 4,

    /// A non-configuration argument was rejected, such as a short buffer.
    InvalidParameter = 5,
}

impl From<DefaultForestFireError> for ForestFireErrorCode {
    fn from(error: DefaultForestFireError) -> Self {
        error.code
    }
}

thread_local! {
    /// Message and code of this thread's most recent call. The message is kept
    /// here so the pointer handed to C stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, ForestFireErrorCode)> = const { RefCell::new((None, ForestFireErrorCode::Ok)) };
}

pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, ForestFireErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, ForestFireErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Message of the last failed call on this thread, or null after a success.
///
/// The string belongs to the library and stays valid until the next
/// `forest_fire_*` call on the same thread. Do not free it.
#[no_mangle]
pub extern "C" fn forest_fire_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Code of the last call on this thread.
#[no_mangle]
pub extern "C" fn forest_fire_get_last_error_code() -> ForestFireErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
