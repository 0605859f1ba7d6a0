//! Error types surfaced by the simulation API
//!
//! Only caller misuse can fail: building a run from a bad configuration, or
//! stepping a run past its horizon. Once a run is constructed a tick itself
//! cannot fail.

use thiserror::Error;

/// Errors returned by [`Simulation`](crate::Simulation) construction and stepping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Construction parameters were rejected; the run never starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `advance_tick` was called after the run reached its horizon.
    #[error("simulation finished: horizon of {horizon} ticks already reached")]
    SimulationFinished {
        /// Horizon the run terminated at
        horizon: u32,
    },
}

impl SimulationError {
    /// Shorthand for an [`SimulationError::InvalidConfiguration`] with a formatted message.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration(message.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = SimulationError::invalid("density must be within [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "invalid configuration: density must be within [0, 1], got 1.5"
        );

        let err = SimulationError::SimulationFinished { horizon: 90 };
        assert!(err.to_string().contains("90 ticks"));
    }
}
