//! Binned dataset model.

use crate::{Error, Result};
use ndarray::{Array1, ArrayD, ArrayView1};
use std::collections::BTreeMap;

/// A labelled 1-D sample axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Human-readable label (e.g. `dldTime`, `delayStage`).
    pub label: String,
    /// Physical value of each bin along the dimension.
    pub values: Array1<f64>,
}

impl Axis {
    /// Creates a new axis.
    pub fn new(label: impl Into<String>, values: impl Into<Array1<f64>>) -> Self {
        Self {
            label: label.into(),
            values: values.into(),
        }
    }

    /// Returns the number of bins along this axis.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the axis has no bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a view of the axis values.
    #[inline]
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }
}

/// An N-dimensional binned data array together with one axis per dimension
/// and any number of named normalization histograms.
///
/// The leading dimension is the frame dimension (typically pump-probe delay
/// steps). Histograms are indexed along it.
///
/// A `BinnedDataset` always satisfies `axes.len() == data.ndim()` and
/// `axes[i].len() == data.shape()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedDataset {
    data: ArrayD<f64>,
    axes: Vec<Axis>,
    histograms: BTreeMap<String, Array1<f64>>,
}

impl BinnedDataset {
    /// Creates a dataset after checking axis extents against the data shape.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if `data` is zero-dimensional, if the
    /// axis count differs from `data.ndim()`, or if any axis length differs
    /// from the matching data extent.
    pub fn new(
        data: ArrayD<f64>,
        axes: Vec<Axis>,
        histograms: BTreeMap<String, Array1<f64>>,
    ) -> Result<Self> {
        if data.ndim() == 0 {
            return Err(Error::ShapeMismatch(
                "data must have at least one dimension".to_string(),
            ));
        }
        if axes.len() != data.ndim() {
            return Err(Error::ShapeMismatch(format!(
                "{} axes given for {}-dimensional data",
                axes.len(),
                data.ndim()
            )));
        }
        for (index, (axis, &extent)) in axes.iter().zip(data.shape()).enumerate() {
            if axis.len() != extent {
                return Err(Error::ShapeMismatch(format!(
                    "axis {index} ({}) has {} values but dimension {index} has extent {extent}",
                    axis.label,
                    axis.len()
                )));
            }
        }
        Ok(Self {
            data,
            axes,
            histograms,
        })
    }

    /// Returns the data array.
    #[inline]
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Returns the axes in dimension order.
    #[inline]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Returns the axis for one dimension.
    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    /// Returns all histograms keyed by name.
    #[inline]
    pub fn histograms(&self) -> &BTreeMap<String, Array1<f64>> {
        &self.histograms
    }

    /// Looks up a histogram by name.
    pub fn histogram(&self, name: &str) -> Option<&Array1<f64>> {
        self.histograms.get(name)
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Returns the data shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Returns the extent of the leading (frame) dimension.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.data.shape()[0]
    }

    /// Consumes the dataset and returns its parts.
    pub fn into_parts(self) -> (ArrayD<f64>, Vec<Axis>, BTreeMap<String, Array1<f64>>) {
        (self.data, self.axes, self.histograms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn axes_for(shape: &[usize]) -> Vec<Axis> {
        shape
            .iter()
            .enumerate()
            .map(|(i, &n)| Axis::new(format!("dim{i}"), Array1::linspace(0.0, 1.0, n)))
            .collect()
    }

    #[test]
    fn test_new_accepts_matching_axes() {
        let data = ArrayD::zeros(IxDyn(&[3, 5, 4, 4]));
        let mut histograms = BTreeMap::new();
        histograms.insert("delay".to_string(), Array1::from(vec![1.0, 2.0, 3.0]));

        let dataset = BinnedDataset::new(data, axes_for(&[3, 5, 4, 4]), histograms).unwrap();
        assert_eq!(dataset.ndim(), 4);
        assert_eq!(dataset.frame_count(), 3);
        assert_eq!(dataset.axis(1).unwrap().len(), 5);
        assert!(dataset.histogram("delay").is_some());
        assert!(dataset.histogram("missing").is_none());
    }

    #[test]
    fn test_new_rejects_axis_count() {
        let data = ArrayD::zeros(IxDyn(&[2, 2]));
        let err = BinnedDataset::new(data, axes_for(&[2]), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_new_rejects_axis_length() {
        let data = ArrayD::zeros(IxDyn(&[2, 3]));
        let err = BinnedDataset::new(data, axes_for(&[2, 4]), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn test_new_rejects_scalar() {
        let data = ArrayD::zeros(IxDyn(&[]));
        let err = BinnedDataset::new(data, Vec::new(), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }
}
