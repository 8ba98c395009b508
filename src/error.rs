use thiserror::Error;

/// Top-level error type for the optimizer crate.
///
/// Only ever returned for problems surfaced *before* the evolution loop
/// starts — missing/malformed parameters, a domain violation in a
/// hand-built genome, or a collaborator construction failure. Fitness
/// evaluation never returns `Err`; an infeasible simulation is caught
/// locally and mapped to the sentinel cost (see `optimizer::fitness`).
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("invalid run parameters: {0}")]
    InvalidParameters(String),

    #[error("genome has wrong length: expected {expected}, got {actual}")]
    InvalidGenomeLength { expected: usize, actual: usize },

    #[error("battery configuration error: {0}")]
    Battery(#[from] crate::domain::battery::BatteryError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
