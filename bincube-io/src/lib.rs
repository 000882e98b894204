//! bincube-io: HDF5 persistence for binned datasets.
//!
//! This crate stores a [`BinnedDataset`](bincube_core::BinnedDataset) as
//! three HDF5 groups (`frames/`, `axes/`, `histograms/`), reloads it, and
//! exports FIJI-compatible hyperstacks.
//!

mod error;
pub mod hyperstack;
pub mod memory;
mod paths;
pub mod store;

pub use error::{Error, Result};
pub use hyperstack::save_hyperstack;
pub use memory::{memory_status, MemoryStatus};
pub use paths::EXTENSION;
pub use store::{inspect, load, load_frame, save, AxisEntry, DatasetStore, SaveOptions, StoreSummary};
