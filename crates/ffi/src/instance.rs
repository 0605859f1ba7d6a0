use forest_fire_core::{
    FlamabilityDistribution, Simulation, SimulationConfig, SpreadModel, StarterSuppression,
};
use std::ptr;
use std::sync::{Mutex, RwLock};

use crate::error::{DefaultForestFireError, ForestFireErrorCode};
use crate::helpers::{track_error, track_result};

/// C-compatible run configuration.
///
/// Mirrors `SimulationConfig`; enum-valued fields are passed as small integer
/// codes and validated on creation.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForestFireConfig {
    /// Number of rows, must be positive.
    pub height: i32,
    /// Number of columns, must be positive.
    pub width: i32,
    /// Tree placement probability in `[0, 1]`.
    pub density: f64,
    /// 0 = uniform, 1 = normal, 2 = bimodal, 3 = constant.
    pub distribution: u8,
    /// Light the left column at tick 0.
    pub start_cells: bool,
    /// Light trees probabilistically at tick 0 (ignored when `start_cells` is set).
    pub start_stage: bool,
    /// Seed of the run's pseudorandom generator.
    pub seed: u64,
    /// Ticks before the run finishes (reference 90).
    pub horizon: u32,
    /// Per-tick flamability growth (reference 0.02).
    pub growth_rate: f64,
    /// 0 = compounding, 1 = legacy linear.
    pub spread_model: u8,
    /// 0 = suppress seeded trees only, 1 = suppress the whole starter-stage run.
    pub starter_suppression: u8,
}

impl ForestFireConfig {
    pub(crate) fn to_simulation_config(self) -> Result<SimulationConfig, DefaultForestFireError> {
        let height = usize::try_from(self.height)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                DefaultForestFireError::invalid_configuration(
                    "height",
                    &format!("must be positive, got {}", self.height),
                )
            })?;
        let width = usize::try_from(self.width)
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(|| {
                DefaultForestFireError::invalid_configuration(
                    "width",
                    &format!("must be positive, got {}", self.width),
                )
            })?;
        let distribution = FlamabilityDistribution::ALL
            .into_iter()
            .find(|d| distribution_code(*d) == self.distribution)
            .ok_or_else(|| {
                DefaultForestFireError::invalid_configuration(
                    "distribution",
                    &format!("expected 0-3, got {}", self.distribution),
                )
            })?;
        let spread_model = [SpreadModel::Compounding, SpreadModel::Linear]
            .into_iter()
            .find(|m| spread_model_code(*m) == self.spread_model)
            .ok_or_else(|| {
                DefaultForestFireError::invalid_configuration(
                    "spread_model",
                    &format!("expected 0-1, got {}", self.spread_model),
                )
            })?;
        let starter_suppression = [StarterSuppression::SeededCells, StarterSuppression::WholeRun]
            .into_iter()
            .find(|s| starter_suppression_code(*s) == self.starter_suppression)
            .ok_or_else(|| {
                DefaultForestFireError::invalid_configuration(
                    "starter_suppression",
                    &format!("expected 0-1, got {}", self.starter_suppression),
                )
            })?;

        Ok(SimulationConfig {
            height,
            width,
            density: self.density,
            distribution,
            start_cells: self.start_cells,
            start_stage: self.start_stage,
            seed: self.seed,
            horizon: self.horizon,
            growth_rate: self.growth_rate,
            spread_model,
            starter_suppression,
        })
    }
}

fn distribution_code(distribution: FlamabilityDistribution) -> u8 {
    match distribution {
        FlamabilityDistribution::Uniform => 0,
        FlamabilityDistribution::Normal => 1,
        FlamabilityDistribution::Bimodal => 2,
        FlamabilityDistribution::Constant => 3,
    }
}

fn spread_model_code(model: SpreadModel) -> u8 {
    match model {
        SpreadModel::Compounding => 0,
        SpreadModel::Linear => 1,
    }
}

fn starter_suppression_code(suppression: StarterSuppression) -> u8 {
    match suppression {
        StarterSuppression::SeededCells => 0,
        StarterSuppression::WholeRun => 1,
    }
}

impl From<&SimulationConfig> for ForestFireConfig {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            height: i32::try_from(config.height).unwrap_or(i32::MAX),
            width: i32::try_from(config.width).unwrap_or(i32::MAX),
            density: config.density,
            distribution: distribution_code(config.distribution),
            start_cells: config.start_cells,
            start_stage: config.start_stage,
            seed: config.seed,
            horizon: config.horizon,
            growth_rate: config.growth_rate,
            spread_model: spread_model_code(config.spread_model),
            starter_suppression: starter_suppression_code(config.starter_suppression),
        }
    }
}

/// Reference configuration: 100 × 100, density 0.65, uniform, left edge lit,
/// 90 ticks, growth 0.02.
#[no_mangle]
pub extern "C" fn forest_fire_default_config() -> ForestFireConfig {
    ForestFireConfig::from(&SimulationConfig::default())
}

/// A forest fire run owned by the caller.
///
/// # Thread Safety
/// The simulation is behind an `RwLock`: queries take a read lock, ticks take
/// the write lock. The snapshot buffer is reused between calls behind a `Mutex`.
pub struct ForestFireInstance {
    pub(crate) sim: RwLock<Simulation>,
    /// Cached row-major snapshot values, reused by `forest_fire_snapshot`.
    pub(crate) snapshot_cache: Mutex<Vec<f64>>,
}

impl ForestFireInstance {
    /// Validate `config` and build the run.
    ///
    /// # Errors
    ///
    /// Returns `ForestFireErrorCode::InvalidConfiguration` for any rejected field.
    pub(crate) fn new(config: &ForestFireConfig) -> Result<Box<Self>, DefaultForestFireError> {
        let sim = Simulation::new(config.to_simulation_config()?)?;
        // Sized only after the grid dimensions have passed validation
        let cells = sim.grid().width() * sim.grid().height();
        Ok(Box::new(Self {
            sim: RwLock::new(sim),
            snapshot_cache: Mutex::new(Vec::with_capacity(cells)),
        }))
    }
}

/// Start a run and return it via out-parameter.
///
/// Returns
/// - `ForestFireErrorCode::Ok` (0) on success, `out_instance` holds the run
/// - `ForestFireErrorCode::NullPointer` if `config` or `out_instance` is null
/// - `ForestFireErrorCode::InvalidConfiguration` if the configuration was rejected;
///   `out_instance` is set to null
///
/// Call `forest_fire_get_last_error()` for a description of the failure.
///
/// # Safety
///
/// - `config` must point to a readable `ForestFireConfig`.
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned instance and MUST call `forest_fire_destroy`
///   exactly once.
#[no_mangle]
pub unsafe extern "C" fn forest_fire_run(
    config: *const ForestFireConfig,
    out_instance: *mut *mut ForestFireInstance,
) -> ForestFireErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultForestFireError::null_pointer("out_instance"));
    }
    let Some(config) = (unsafe { config.as_ref() }) else {
        unsafe {
            *out_instance = ptr::null_mut();
        }
        return track_error(&DefaultForestFireError::null_pointer("config"));
    };

    match track_result(ForestFireInstance::new(config)) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            ForestFireErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroy a run created by `forest_fire_run`. Null is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `forest_fire_run` and not destroyed already.
/// - The caller must not use the pointer afterwards.
#[no_mangle]
pub unsafe extern "C" fn forest_fire_destroy(ptr: *mut ForestFireInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: created by `Box::into_raw` in `forest_fire_run` and not yet freed.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
