//! bincube-core: Core types for binned multi-dimensional datasets.
//!
//! This crate provides the in-memory dataset model, axis tags and
//! permutation specs, nearest-value lookup over sample axes, and the
//! energy calibration hook used by the reshape step.
//!

pub mod calibration;
pub mod dataset;
pub mod error;
pub mod lookup;
pub mod order;

pub use calibration::{EnergyCalibration, FlightPathCalibration};
pub use dataset::{Axis, BinnedDataset};
pub use error::{Error, Result};
pub use lookup::{argnearest, nearest, LookupMode, Nearest};
pub use order::{tags, AxisOrder};
