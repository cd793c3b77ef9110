// src/error.rs

use thiserror::Error;

/// Errors raised by the eigenface pipeline.
///
/// Every variant is fatal to the call that produced it. The sweep is the only
/// place where an error is contained: it is recorded against the failing K and
/// the remaining K values are still computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EigenfaceError {
    /// Matrices or vectors with inconsistent dimensionality were combined.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },
    /// Requested subspace dimension is outside `[1, max]`.
    #[error("K = {k} is out of range; must satisfy 1 <= K <= {max}")]
    OutOfRangeK { k: usize, max: usize },
    /// The eigensolver failed, timed out, or produced non-finite output.
    #[error("computation failed: {0}")]
    ComputeFailure(String),
    /// A matrix that needs at least one row and one column was empty.
    #[error("empty input: {0}")]
    EmptyInput(String),
    /// A configuration value is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Saving or loading eigenpairs failed.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, EigenfaceError>;

impl EigenfaceError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> Self {
        EigenfaceError::ShapeMismatch {
            context,
            expected: format!("{:?}", expected),
            found: format!("{:?}", found),
        }
    }
}
