//! System memory status.

use std::fmt;
use sysinfo::System;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const GIB: f64 = 1_073_741_824.0;

/// Snapshot of system memory, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemoryStatus {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
}

impl MemoryStatus {
    /// Percentage of total memory in use.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_used(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }

    /// Returns false only when available memory is known and too small.
    #[must_use]
    pub fn fits(&self, bytes: u64) -> bool {
        self.available == 0 || bytes <= self.available
    }
}

impl fmt::Display for MemoryStatus {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total: {:.4} GB", self.total as f64 / GIB)?;
        writeln!(f, "available: {:.4} GB", self.available as f64 / GIB)?;
        writeln!(f, "percent: {:.3}%", self.percent_used())?;
        writeln!(f, "used: {:.4} GB", self.used as f64 / GIB)?;
        write!(f, "free: {:.4} GB", self.free as f64 / GIB)
    }
}

/// Queries current system memory.
#[must_use]
pub fn memory_status() -> MemoryStatus {
    let mut system = System::new();
    system.refresh_memory();
    MemoryStatus {
        total: system.total_memory(),
        available: system.available_memory(),
        used: system.used_memory(),
        free: system.free_memory(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_status_consistent() {
        let status = memory_status();
        assert!(status.available <= status.total || status.total == 0);
        assert!(status.percent_used() >= 0.0);
    }

    #[test]
    fn test_fits_and_display() {
        let status = MemoryStatus {
            total: 4 * 1_073_741_824,
            available: 1_073_741_824,
            used: 1_073_741_824,
            free: 512,
        };
        assert!(status.fits(1024));
        assert!(!status.fits(2 * 1_073_741_824));
        assert!((status.percent_used() - 25.0).abs() < f64::EPSILON);

        let text = status.to_string();
        assert!(text.contains("total: 4.0000 GB"));
        assert!(text.contains("percent: 25.000%"));
    }
}
