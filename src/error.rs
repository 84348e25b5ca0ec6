//! Error types for rust_mtl_grn

use thiserror::Error;

/// Main error type for multi-task network inference
#[derive(Error, Debug)]
pub enum MtlError {
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("Insufficient data for gene {gene_id}: {reason}")]
    InsufficientData { gene_id: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Numerical instability in {operation}: {details}")]
    NumericalInstability { operation: String, details: String },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl MtlError {
    /// Shorthand for the common "expected N things, got M things" shape error
    pub(crate) fn shape(expected: impl Into<String>, got: impl Into<String>) -> Self {
        MtlError::ShapeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

/// Result type alias for network inference operations
pub type Result<T> = std::result::Result<T, MtlError>;
