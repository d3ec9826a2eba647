//! Error types.
//!
//! Two layers:
//!
//! - [`ModelError`] is what the engine returns. Each variant maps to one failure
//!   class of the model (bad parameters, a trajectory that ran out of steps, a
//!   solver that did not converge, a value outside its domain).
//! - [`AppError`] is what the `methyl` binary reports: a message plus the process
//!   exit code.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failures raised by model construction, simulation and the analytic solvers.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Invalid parameters; the model (or options record) is rejected.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A population vector had the wrong number of states.
    #[error("population vector has {found} states, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    /// One trajectory exceeded its step guard. Recoverable: callers discard the run.
    #[error("simulation exceeded {max_steps} steps")]
    StepBudgetExceeded { max_steps: u64 },

    /// The trajectory was aborted through its cancel token or deadline.
    #[error("simulation cancelled after {steps} steps")]
    Cancelled { steps: u64 },

    /// An iterative solver hit its iteration cap without meeting tolerance.
    #[error("{solver} did not converge after {iterations} iterations (residual {residual:.3e})")]
    NonConvergence {
        solver: &'static str,
        iterations: usize,
        residual: f64,
        last: Vec<f64>,
    },

    /// A computed probability or rate fell outside its valid domain.
    #[error("numerical domain error: {0}")]
    NumericalDomain(String),
}

impl ModelError {
    pub fn config(message: impl Into<String>) -> Self {
        ModelError::Configuration(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        ModelError::NumericalDomain(message.into())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match err {
            ModelError::Configuration(_) | ModelError::DimensionMismatch { .. } => 2,
            ModelError::StepBudgetExceeded { .. } | ModelError::Cancelled { .. } => 3,
            ModelError::NonConvergence { .. } | ModelError::NumericalDomain(_) => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_to_exit_codes() {
        let err: AppError = ModelError::config("M must be >= 1").into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("M must be >= 1"));

        let err: AppError = ModelError::NonConvergence {
            solver: "power iteration",
            iterations: 10,
            residual: 1e-3,
            last: vec![0.5, 0.5],
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("power iteration"));
    }
}
