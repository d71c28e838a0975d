//! Error taxonomy for the simulation engine.
//!
//! Errors local to a single creature never abort a tick. Only
//! [`SimulationError::InvalidConfig`] is meant to reach the caller at startup.

/// Errors produced by the simulation engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    /// Brain generation or crossover did not converge within its iteration budget.
    #[error("brain wiring did not converge after {attempts} attempts")]
    GenerationExhausted {
        /// Number of attempts spent before giving up.
        attempts: usize,
    },

    /// A configuration value cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A model invariant does not hold. Indicates a logic defect.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A movement computation panicked inside the worker pool.
    #[error("movement task failed for creature {creature_id}")]
    WorkerTaskFailure {
        /// Creature whose movement could not be computed.
        creature_id: u64,
    },
}
