//! Per-frame histogram normalization.

use bincube_core::{Error, Result};
use ndarray::{ArrayD, ArrayView1};
use rayon::prelude::*;

/// Divides every frame of `data` by `histogram[frame] / max(histogram)`.
///
/// The histogram indexes the leading dimension. Non-finite quotients
/// (division by zero, NaN) are replaced with 0. The input is not modified.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if the histogram length differs from the
/// leading extent of `data`.
pub fn normalize_by_histogram(
    data: &ArrayD<f64>,
    histogram: ArrayView1<'_, f64>,
) -> Result<ArrayD<f64>> {
    let frames = data.shape().first().copied().unwrap_or(0);
    if histogram.len() != frames {
        return Err(Error::InvalidInput(format!(
            "histogram has {} bins but data has {frames} frames",
            histogram.len()
        )));
    }

    let mut out = data.as_standard_layout().into_owned();
    if out.is_empty() {
        return Ok(out);
    }

    let max = histogram.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let weights: Vec<f64> = histogram.iter().map(|&h| h / max).collect();
    let frame_len = out.len() / frames;

    let values = out
        .as_slice_mut()
        .ok_or_else(|| Error::ShapeMismatch("normalized copy is not contiguous".to_string()))?;
    values
        .par_chunks_mut(frame_len)
        .zip(weights.par_iter())
        .for_each(|(frame, &weight)| {
            for v in frame {
                *v = finite_or_zero(*v / weight);
            }
        });

    Ok(out)
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array, IxDyn};

    #[test]
    fn test_normalize_scales_by_relative_exposure() {
        let data = Array::from_elem(IxDyn(&[3, 2, 2]), 8.0);
        let hist = arr1(&[1.0, 2.0, 4.0]);

        let out = normalize_by_histogram(&data, hist.view()).unwrap();
        assert_eq!(out[[0, 0, 0]], 32.0);
        assert_eq!(out[[1, 1, 0]], 16.0);
        assert_eq!(out[[2, 1, 1]], 8.0);
        // Input untouched.
        assert_eq!(data[[0, 0, 0]], 8.0);
    }

    #[test]
    fn test_normalize_zero_bins_become_zero() {
        let mut data = Array::from_elem(IxDyn(&[3, 2]), 5.0);
        data[[2, 0]] = 0.0;
        let hist = arr1(&[0.0, 10.0, 0.0]);

        let out = normalize_by_histogram(&data, hist.view()).unwrap();
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[0, 1]], 0.0);
        assert_eq!(out[[1, 0]], 5.0);
        assert_eq!(out[[2, 0]], 0.0);
        assert_eq!(out[[2, 1]], 0.0);
    }

    #[test]
    fn test_normalize_non_contiguous_input() {
        let base = Array::from_shape_fn(IxDyn(&[2, 3]), |ix| (ix[0] * 3 + ix[1]) as f64);
        let transposed = base.t().to_owned();
        let hist = arr1(&[1.0, 1.0, 2.0]);
        let out = normalize_by_histogram(&transposed, hist.view()).unwrap();
        assert_eq!(out[[2, 1]], base[[1, 2]]);
        assert_eq!(out[[0, 1]], base[[1, 0]] * 2.0);
    }

    #[test]
    fn test_normalize_length_mismatch() {
        let data = Array::zeros(IxDyn(&[3, 2]));
        let hist = arr1(&[1.0, 2.0]);
        let err = normalize_by_histogram(&data, hist.view()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
