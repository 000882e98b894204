//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HDF5 library error.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// No artifact at the given path.
    #[error("no binned dataset at {}", .0.display())]
    NotFound(PathBuf),

    /// Target exists and overwriting was not requested.
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Structurally invalid container.
    #[error("corrupt binned dataset: {0}")]
    CorruptFormat(String),

    /// Argument rejected before touching the file.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] bincube_core::Error),
}
