//! Error types for scoring and reduction.

use crate::kernels::KernelError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Everything that can go wrong while aligning, scoring or reducing labeled arrays.
///
/// A call either fully succeeds or returns one of these; no variant carries a
/// partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// A dimension shared by two inputs has incompatible non-unit sizes.
    #[error("dimension `{dim}` has incompatible sizes {left} and {right}")]
    Shape {
        dim: String,
        left: usize,
        right: usize,
    },

    /// Both inputs label a shared dimension, but with different coordinates.
    #[error("coordinate labels on dimension `{dim}` do not align")]
    CoordinateMismatch { dim: String },

    /// A dimension required by the operation is not present on an input.
    #[error("{role} is missing dimension `{dim}` (found {found:?})")]
    MissingDimension {
        role: String,
        dim: String,
        found: Vec<String>,
    },

    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// A labeled array could not be constructed from the given parts.
    #[error("invalid labeled array: {0}")]
    InvalidArray(String),

    #[error("variable `{0}` is missing from the forecast dataset")]
    MissingVariable(String),

    /// The pointwise kernel rejected one of its cells. The kernel's own error
    /// is kept as the source.
    #[error("{operation} failed")]
    KernelComputation {
        operation: &'static str,
        #[source]
        source: KernelError,
    },
}

impl ScoreError {
    pub(crate) fn missing_dimension(role: &str, dim: &str, found: &[String]) -> Self {
        ScoreError::MissingDimension {
            role: role.to_string(),
            dim: dim.to_string(),
            found: found.to_vec(),
        }
    }
}
