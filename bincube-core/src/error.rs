//! Error types for bincube-core.

use thiserror::Error;

/// Result type alias for bincube operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for bincube operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Axis order strings are not a valid permutation pair, or a revert
    /// tag does not name an output dimension.
    #[error("invalid axis specification: {0}")]
    InvalidAxisSpec(String),

    /// Input value rejected before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Array and axis extents disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
