//! Error types for the rollcast library.

use thiserror::Error;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while building tasks, resampling and evaluating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Invalid configuration. Always fatal, never suppressed by an error
    /// policy.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A prediction is shorter than the test window it must be scored
    /// against.
    #[error("prediction too short for test window: have {have}, need {need}")]
    HorizonTooShort { have: usize, need: usize },

    /// A backend failed to train on a split.
    #[error("backend '{backend}' failed to train: {detail}")]
    BackendTrain { backend: String, detail: String },

    /// A backend failed to produce a forecast.
    #[error("backend '{backend}' failed to predict: {detail}")]
    BackendPredict { backend: String, detail: String },

    /// `extend`/`update` was called with rows that do not contiguously
    /// continue the existing series.
    #[error("incremental update mismatch: {0}")]
    IncrementalUpdateMismatch(String),

    /// The backend does not support incremental updates; callers must fall
    /// back to a full retrain.
    #[error("backend '{0}' does not support incremental update")]
    UpdateUnsupported(String),

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Numerical failure (e.g. a singular meta-learner system).
    #[error("computation error: {0}")]
    Computation(String),
}

impl EvalError {
    /// Whether a warn-and-skip policy may recover from this error by
    /// skipping the affected split. Configuration and contiguity errors
    /// never cross a policy boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EvalError::HorizonTooShort { .. }
                | EvalError::BackendTrain { .. }
                | EvalError::BackendPredict { .. }
                | EvalError::UpdateUnsupported(_)
        )
    }
}
