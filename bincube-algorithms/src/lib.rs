//! bincube-algorithms: Transformations over binned datasets.
//!
//! This crate provides:
//! - **Reshape** - axis reordering, reversal and offset correction
//! - **Normalization** - per-frame division by an exposure histogram
//! - **Corrections** - pure functions over detector event columns
//!
#![warn(missing_docs)]

pub mod corrections;
mod normalize;
mod reshape;

pub use corrections::{
    correct_optical_path, filter_circle, radius, shift_quadrants, CircleFilter,
    OpticalPathCorrection, QuadrantShift,
};
pub use normalize::normalize_by_histogram;
pub use reshape::{transform, transform_with_calibration, Offsets, ReshapeOptions};

// Re-export core types used in signatures
pub use bincube_core::{AxisOrder, BinnedDataset, EnergyCalibration};
