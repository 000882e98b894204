//! Axis reordering, reversal and offset correction of binned datasets.

use crate::normalize::normalize_by_histogram;
use bincube_core::order::tags;
use bincube_core::{Axis, AxisOrder, BinnedDataset, EnergyCalibration, Error, Result};
use log::{debug, warn};
use ndarray::s;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar offsets subtracted from output axes after reordering.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Offsets {
    /// Pump-probe time zero, subtracted from the `t` axis.
    pub time_zero: Option<f64>,
    /// Momentum centre, subtracted from the `x` axis.
    pub kx_center: Option<f64>,
    /// Momentum centre, subtracted from the `y` axis.
    pub ky_center: Option<f64>,
    /// Energy offset passed to the calibration of the `e` axis.
    pub energy_offset: Option<f64>,
    /// Time-of-flight offset passed to the calibration of the `e` axis.
    pub tof_offset: Option<f64>,
}

impl Offsets {
    /// Sets the pump-probe time zero.
    #[must_use]
    pub fn with_time_zero(mut self, t0: f64) -> Self {
        self.time_zero = Some(t0);
        self
    }

    /// Sets the kx centre.
    #[must_use]
    pub fn with_kx_center(mut self, kx0: f64) -> Self {
        self.kx_center = Some(kx0);
        self
    }

    /// Sets the ky centre.
    #[must_use]
    pub fn with_ky_center(mut self, ky0: f64) -> Self {
        self.ky_center = Some(ky0);
        self
    }

    /// Sets the energy and time-of-flight offsets used for calibration.
    #[must_use]
    pub fn with_energy_calibration(mut self, energy_offset: f64, tof_offset: f64) -> Self {
        self.energy_offset = Some(energy_offset);
        self.tof_offset = Some(tof_offset);
        self
    }

    /// Returns the plain shift for a tag, if any.
    pub fn shift_for(&self, tag: char) -> Option<f64> {
        match tag {
            tags::TIME => self.time_zero,
            tags::KX => self.kx_center,
            tags::KY => self.ky_center,
            _ => None,
        }
    }

    /// Returns `(energy_offset, tof_offset)` when both are set.
    pub fn energy_pair(&self) -> Option<(f64, f64)> {
        match (self.energy_offset, self.tof_offset) {
            (Some(energy), Some(tof)) => Some((energy, tof)),
            _ => None,
        }
    }
}

/// Options for [`transform`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ReshapeOptions {
    /// Histogram to normalize the frames by.
    pub normalize_by: Option<String>,
    /// Axis offsets applied after reordering.
    pub offsets: Offsets,
    /// Tags whose data and axis values are flipped in the output.
    pub revert: String,
}

impl ReshapeOptions {
    /// Creates options with no normalization, offsets or reversal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes by the named histogram.
    #[must_use]
    pub fn with_normalize_by(mut self, name: impl Into<String>) -> Self {
        self.normalize_by = Some(name.into());
        self
    }

    /// Sets the axis offsets.
    #[must_use]
    pub fn with_offsets(mut self, offsets: Offsets) -> Self {
        self.offsets = offsets;
        self
    }

    /// Sets the tags to flip, e.g. `"te"`.
    #[must_use]
    pub fn with_revert(mut self, revert: impl Into<String>) -> Self {
        self.revert = revert.into();
        self
    }
}

/// Converts `dataset` from `order_in` to `order_out`.
///
/// Steps, in order: optional histogram normalization of the frames,
/// reordering of the axes, permutation of the data by pairwise swaps,
/// reversal of the tags in `options.revert`, and subtraction of offsets.
/// The `e` axis is left untouched because no calibration is given; see
/// [`transform_with_calibration`].
///
/// # Errors
/// Returns [`Error::InvalidAxisSpec`] if the orders are not a permutation
/// pair matching the data dimensionality or a revert tag is not in
/// `order_out`, and [`Error::InvalidInput`] if the normalization histogram
/// is missing or has the wrong length.
pub fn transform(
    dataset: &BinnedDataset,
    order_in: &str,
    order_out: &str,
    options: &ReshapeOptions,
) -> Result<BinnedDataset> {
    reshape(dataset, order_in, order_out, options, None)
}

/// Like [`transform`], and additionally replaces the `e` axis with
/// calibrated energies when both energy offsets are set.
///
/// # Errors
/// Same as [`transform`]; also [`Error::ShapeMismatch`] if the calibration
/// returns an axis of the wrong length.
pub fn transform_with_calibration(
    dataset: &BinnedDataset,
    order_in: &str,
    order_out: &str,
    options: &ReshapeOptions,
    calibration: &dyn EnergyCalibration,
) -> Result<BinnedDataset> {
    reshape(dataset, order_in, order_out, options, Some(calibration))
}

fn reshape(
    dataset: &BinnedDataset,
    order_in: &str,
    order_out: &str,
    options: &ReshapeOptions,
    calibration: Option<&dyn EnergyCalibration>,
) -> Result<BinnedDataset> {
    warn!("reshape transform is experimental; check axis orientation of the result");

    let order_in = AxisOrder::parse(order_in)?;
    let order_out = AxisOrder::parse(order_out)?;
    if order_in.len() != dataset.ndim() {
        return Err(Error::InvalidAxisSpec(format!(
            "order {order_in} has {} tags but data has {} dimensions",
            order_in.len(),
            dataset.ndim()
        )));
    }
    let permutation = order_in.permutation_to(&order_out)?;
    let revert = revert_tags(&options.revert, &order_out)?;

    let mut data = match &options.normalize_by {
        Some(name) => {
            let histogram = dataset.histogram(name).ok_or_else(|| {
                Error::InvalidInput(format!("no histogram named {name:?} in dataset"))
            })?;
            normalize_by_histogram(dataset.data(), histogram.view())?
        }
        None => dataset.data().clone(),
    };

    let mut axes: Vec<Axis> = permutation
        .iter()
        .zip(order_out.tags())
        .map(|(&source, tag)| {
            let mut axis = dataset.axes()[source].clone();
            if revert.contains(tag) {
                axis.values = axis.values.slice(s![..;-1]).to_owned();
            }
            axis
        })
        .collect();

    let mut current = order_in.tags().to_vec();
    for (i, &tag) in order_out.tags().iter().enumerate() {
        if current[i] == tag {
            continue;
        }
        let j = current
            .iter()
            .position(|&t| t == tag)
            .ok_or_else(|| Error::InvalidAxisSpec(format!("tag '{tag}' lost during reorder")))?;
        data.swap_axes(i, j);
        current.swap(i, j);
        debug!("swapped axes {i} and {j}, order now {}", String::from_iter(&current));
    }

    for (i, tag) in order_out.tags().iter().enumerate() {
        if revert.contains(tag) {
            data.invert_axis(ndarray::Axis(i));
        }
    }
    let data = data.as_standard_layout().into_owned();

    for (axis, &tag) in axes.iter_mut().zip(order_out.tags()) {
        if tag == tags::ENERGY {
            match (options.offsets.energy_pair(), calibration) {
                (Some((energy_offset, tof_offset)), Some(calibration)) => {
                    axis.values = calibration.tof_to_energy(axis.view(), energy_offset, tof_offset);
                }
                (Some(_), None) => {
                    debug!("energy offsets set without a calibration; {} axis left unchanged", axis.label);
                }
                (None, _) => {}
            }
        } else if let Some(shift) = options.offsets.shift_for(tag) {
            axis.values -= shift;
        }
    }

    BinnedDataset::new(data, axes, dataset.histograms().clone())
}

fn revert_tags(revert: &str, order_out: &AxisOrder) -> Result<Vec<char>> {
    revert
        .chars()
        .map(|tag| {
            if order_out.contains(tag) {
                Ok(tag)
            } else {
                Err(Error::InvalidAxisSpec(format!(
                    "revert tag '{tag}' is not in output order {order_out}"
                )))
            }
        })
        .collect()
}
