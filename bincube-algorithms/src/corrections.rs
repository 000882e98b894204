//! Detector event corrections.
//!
//! Pure functions over event columns (`x`, `y` detector positions and `t`
//! time-of-flight). Each returns a new column and leaves its inputs intact.

use bincube_core::{Error, Result};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-quadrant time-of-flight shifts around a detector centre.
///
/// ```text
///      Q2     |     Q4
/// ------------|------------
///      Q1     |     Q3
/// ```
///
/// Quadrants include their boundary, so an event exactly on a dividing line
/// receives the shift of every quadrant it touches.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuadrantShift {
    /// Shift for `x <= xc, y <= yc`.
    pub q1: f64,
    /// Shift for `x <= xc, y >= yc`.
    pub q2: f64,
    /// Shift for `x >= xc, y <= yc`.
    pub q3: f64,
    /// Shift for `x >= xc, y >= yc`.
    pub q4: f64,
    /// Dividing column.
    pub x_center: f64,
    /// Dividing row.
    pub y_center: f64,
}

impl Default for QuadrantShift {
    fn default() -> Self {
        Self {
            q1: 0.231_725,
            q2: -0.221_625,
            q3: 0.096_575,
            q4: -0.106_675,
            x_center: 1350.0,
            y_center: 1440.0,
        }
    }
}

impl QuadrantShift {
    fn shift(&self, x: f64, y: f64) -> f64 {
        let mut shift = 0.0;
        if x <= self.x_center && y <= self.y_center {
            shift += self.q1;
        }
        if x <= self.x_center && y >= self.y_center {
            shift += self.q2;
        }
        if x >= self.x_center && y <= self.y_center {
            shift += self.q3;
        }
        if x >= self.x_center && y >= self.y_center {
            shift += self.q4;
        }
        shift
    }
}

/// Circular acceptance region on the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CircleFilter {
    /// Centre column.
    pub x_center: f64,
    /// Centre row.
    pub y_center: f64,
    /// Acceptance radius (inclusive).
    pub radius: f64,
}

impl Default for CircleFilter {
    fn default() -> Self {
        Self {
            x_center: 1334.0,
            y_center: 1426.0,
            radius: 1250.0,
        }
    }
}

impl CircleFilter {
    /// Returns true if the position lies within the radius.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (x - self.x_center).hypot(y - self.y_center) <= self.radius
    }
}

/// Radial time-of-flight correction for the path length difference between
/// the detector centre and its edges: `t - (poly1 * r + poly2 * r^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpticalPathCorrection {
    /// Linear coefficient.
    pub poly1: f64,
    /// Quadratic coefficient.
    pub poly2: f64,
    /// Centre column.
    pub x_center: f64,
    /// Centre row.
    pub y_center: f64,
}

impl Default for OpticalPathCorrection {
    fn default() -> Self {
        Self {
            poly1: -0.000_205_78,
            poly2: 4.6813e-7,
            x_center: 1334.0,
            y_center: 1426.0,
        }
    }
}

/// Distance of each event from `center`.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the columns differ in length.
pub fn radius(x: &[f64], y: &[f64], center: (f64, f64)) -> Result<Vec<f64>> {
    check_columns(&[x.len(), y.len()])?;
    Ok(x.par_iter()
        .zip(y.par_iter())
        .map(|(&x, &y)| (x - center.0).hypot(y - center.1))
        .collect())
}

/// Adds the quadrant shift to each time-of-flight value.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the columns differ in length.
pub fn shift_quadrants(x: &[f64], y: &[f64], t: &[f64], shift: &QuadrantShift) -> Result<Vec<f64>> {
    check_columns(&[x.len(), y.len(), t.len()])?;
    Ok(x.par_iter()
        .zip(y.par_iter())
        .zip(t.par_iter())
        .map(|((&x, &y), &t)| t + shift.shift(x, y))
        .collect())
}

/// Mask of events inside the circle.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the columns differ in length.
pub fn filter_circle(x: &[f64], y: &[f64], filter: &CircleFilter) -> Result<Vec<bool>> {
    check_columns(&[x.len(), y.len()])?;
    Ok(x.par_iter()
        .zip(y.par_iter())
        .map(|(&x, &y)| filter.contains(x, y))
        .collect())
}

/// Applies the radial optical path correction to each time-of-flight value.
///
/// # Errors
/// Returns [`Error::ShapeMismatch`] if the columns differ in length.
pub fn correct_optical_path(
    x: &[f64],
    y: &[f64],
    t: &[f64],
    correction: &OpticalPathCorrection,
) -> Result<Vec<f64>> {
    check_columns(&[x.len(), y.len(), t.len()])?;
    Ok(x.par_iter()
        .zip(y.par_iter())
        .zip(t.par_iter())
        .map(|((&x, &y), &t)| {
            let r2 = (x - correction.x_center).powi(2) + (y - correction.y_center).powi(2);
            t - (correction.poly1 * r2.sqrt() + correction.poly2 * r2)
        })
        .collect())
}

fn check_columns(lengths: &[usize]) -> Result<()> {
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        return Err(Error::ShapeMismatch(format!(
            "event columns differ in length: {lengths:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_radius() {
        let r = radius(&[3.0, 0.0], &[4.0, -2.0], (0.0, 0.0)).unwrap();
        assert_relative_eq!(r[0], 5.0);
        assert_relative_eq!(r[1], 2.0);
    }

    #[test]
    fn test_shift_quadrants() {
        let shift = QuadrantShift {
            q1: 1.0,
            q2: 2.0,
            q3: 4.0,
            q4: 8.0,
            x_center: 10.0,
            y_center: 10.0,
        };
        let x = [5.0, 5.0, 15.0, 15.0, 10.0];
        let y = [5.0, 15.0, 5.0, 15.0, 5.0];
        let t = [100.0; 5];

        let out = shift_quadrants(&x, &y, &t, &shift).unwrap();
        assert_eq!(out, vec![101.0, 102.0, 104.0, 108.0, 105.0]);
        assert_eq!(t, [100.0; 5]);
    }

    #[test]
    fn test_filter_circle_inclusive() {
        let filter = CircleFilter {
            x_center: 0.0,
            y_center: 0.0,
            radius: 5.0,
        };
        let mask = filter_circle(&[3.0, 4.0, 0.0], &[4.0, 4.0, 0.0], &filter).unwrap();
        assert_eq!(mask, vec![true, false, true]);
    }

    #[test]
    fn test_correct_optical_path() {
        let correction = OpticalPathCorrection {
            poly1: 0.5,
            poly2: 0.25,
            x_center: 0.0,
            y_center: 0.0,
        };
        let out = correct_optical_path(&[3.0, 0.0], &[4.0, 0.0], &[100.0, 7.0], &correction).unwrap();
        // r = 5 -> 100 - (2.5 + 6.25)
        assert_relative_eq!(out[0], 91.25);
        assert_relative_eq!(out[1], 7.0);
    }

    #[test]
    fn test_column_length_mismatch() {
        let err = radius(&[1.0, 2.0], &[1.0], (0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        let err = shift_quadrants(&[1.0], &[1.0], &[], &QuadrantShift::default()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }
}
