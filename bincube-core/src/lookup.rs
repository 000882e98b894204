//! Nearest-value lookup over sample axes.

use crate::{Error, Result};
use ndarray::{ArrayBase, Data, Dimension};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Return convention for [`nearest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LookupMode {
    /// Linear index in logical (row-major) order.
    #[default]
    Flat,
    /// Per-dimension coordinates.
    Coordinate,
}

/// Position of the element nearest to a lookup value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Nearest {
    /// Linear index.
    Flat(usize),
    /// Coordinates, one per dimension.
    Coordinate(Vec<usize>),
}

impl Nearest {
    /// Returns the flat index, if this is a flat result.
    pub fn flat(&self) -> Option<usize> {
        match self {
            Self::Flat(index) => Some(*index),
            Self::Coordinate(_) => None,
        }
    }

    /// Returns the coordinates, if this is a coordinate result.
    pub fn coordinate(&self) -> Option<&[usize]> {
        match self {
            Self::Flat(_) => None,
            Self::Coordinate(coords) => Some(coords),
        }
    }
}

/// Finds the element of `array` closest to `value` by absolute difference.
///
/// Ties resolve to the lowest flat index. NaN elements only win if no
/// element has a finite distance.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if the array is empty.
pub fn nearest<S, D>(array: &ArrayBase<S, D>, value: f64, mode: LookupMode) -> Result<Nearest>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let flat = argmin_distance(array.iter().copied(), value)
        .ok_or_else(|| Error::InvalidInput("cannot search an empty array".to_string()))?;

    Ok(match mode {
        LookupMode::Flat => Nearest::Flat(flat),
        LookupMode::Coordinate => Nearest::Coordinate(unravel_index(flat, array.shape())),
    })
}

/// Flat-index lookup over a slice.
///
/// # Errors
/// Returns [`Error::InvalidInput`] if `values` is empty.
pub fn argnearest(values: &[f64], value: f64) -> Result<usize> {
    argmin_distance(values.iter().copied(), value)
        .ok_or_else(|| Error::InvalidInput("cannot search an empty array".to_string()))
}

fn argmin_distance<I>(values: I, value: f64) -> Option<usize>
where
    I: Iterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, element) in values.enumerate() {
        let distance = (element - value).abs();
        match best {
            None => best = Some((index, distance)),
            Some((_, current)) if distance < current || (current.is_nan() && !distance.is_nan()) => {
                best = Some((index, distance));
            }
            Some(_) => {}
        }
    }
    best.map(|(index, _)| index)
}

fn unravel_index(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; shape.len()];
    for (coord, &extent) in coords.iter_mut().zip(shape).rev() {
        *coord = flat % extent;
        flat /= extent;
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array1};

    #[test]
    fn test_nearest_flat() {
        let axis = arr1(&[10.0, 20.0, 30.0, 40.0]);
        let found = nearest(&axis, 26.0, LookupMode::Flat).unwrap();
        assert_eq!(found, Nearest::Flat(2));
        assert_eq!(found.flat(), Some(2));
    }

    #[test]
    fn test_nearest_tie_prefers_first() {
        let axis = arr1(&[10.0, 20.0, 30.0]);
        assert_eq!(nearest(&axis, 25.0, LookupMode::Flat).unwrap(), Nearest::Flat(1));
    }

    #[test]
    fn test_nearest_coordinate() {
        let grid = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let found = nearest(&grid, 5.2, LookupMode::Coordinate).unwrap();
        assert_eq!(found.coordinate(), Some(&[1, 1][..]));
    }

    #[test]
    fn test_nearest_coordinate_on_transposed_view() {
        let grid = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let transposed = grid.t();
        // Logical order of the transposed view is 1, 4, 2, 5, 3, 6.
        let found = nearest(&transposed, 3.1, LookupMode::Coordinate).unwrap();
        assert_eq!(found, Nearest::Coordinate(vec![2, 0]));
    }

    #[test]
    fn test_nearest_skips_nan() {
        let axis = arr1(&[f64::NAN, 7.0, 1.0]);
        assert_eq!(nearest(&axis, 0.0, LookupMode::Flat).unwrap(), Nearest::Flat(2));
    }

    #[test]
    fn test_nearest_empty() {
        let axis: Array1<f64> = Array1::zeros(0);
        let err = nearest(&axis, 5.0, LookupMode::Flat).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(argnearest(&[], 5.0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_argnearest_slice() {
        assert_eq!(argnearest(&[-3.0, -1.0, 2.0], 0.0).unwrap(), 1);
    }
}
