//! Dimension tags and axis order specifications.
//!
//! An axis order is a string of single-character tags, one per dimension,
//! e.g. `"texy"` for (delay, time-of-flight, kx, ky).

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Well-known dimension tags.
pub mod tags {
    /// Pump-probe delay (frame) dimension.
    pub const TIME: char = 't';
    /// Energy or time-of-flight dimension.
    pub const ENERGY: char = 'e';
    /// Parallel momentum, x direction.
    pub const KX: char = 'x';
    /// Parallel momentum, y direction.
    pub const KY: char = 'y';
}

/// Ordered sequence of distinct dimension tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AxisOrder {
    tags: Vec<char>,
}

impl AxisOrder {
    /// Parses an order string such as `"texy"`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxisSpec`] if the string is empty, contains
    /// whitespace, or repeats a tag.
    pub fn parse(order: &str) -> Result<Self> {
        if order.is_empty() {
            return Err(Error::InvalidAxisSpec("axis order is empty".to_string()));
        }
        let mut tags = Vec::with_capacity(order.len());
        for tag in order.chars() {
            if tag.is_whitespace() {
                return Err(Error::InvalidAxisSpec(format!(
                    "axis order {order:?} contains whitespace"
                )));
            }
            if tags.contains(&tag) {
                return Err(Error::InvalidAxisSpec(format!(
                    "axis order {order:?} repeats tag '{tag}'"
                )));
            }
            tags.push(tag);
        }
        Ok(Self { tags })
    }

    /// Returns the tags in dimension order.
    #[inline]
    pub fn tags(&self) -> &[char] {
        &self.tags
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always false for a parsed order.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the dimension index of a tag.
    pub fn position(&self, tag: char) -> Option<usize> {
        self.tags.iter().position(|&t| t == tag)
    }

    /// Returns true if the order contains the tag.
    pub fn contains(&self, tag: char) -> bool {
        self.tags.contains(&tag)
    }

    /// Returns true if both orders hold the same tags.
    pub fn is_permutation_of(&self, other: &Self) -> bool {
        self.len() == other.len() && self.tags.iter().all(|&t| other.contains(t))
    }

    /// For each dimension of `target`, the index of the same tag in `self`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxisSpec`] if the orders are not permutations
    /// of each other.
    pub fn permutation_to(&self, target: &Self) -> Result<Vec<usize>> {
        if !self.is_permutation_of(target) {
            return Err(Error::InvalidAxisSpec(format!(
                "axis orders {self} and {target} are not permutations of the same tags"
            )));
        }
        Ok(target
            .tags
            .iter()
            .filter_map(|&tag| self.position(tag))
            .collect())
    }
}

impl FromStr for AxisOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in &self.tags {
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let order = AxisOrder::parse("texy").unwrap();
        assert_eq!(order.tags(), &['t', 'e', 'x', 'y']);
        assert_eq!(order.to_string(), "texy");
        assert_eq!(order.position(tags::KX), Some(2));
    }

    #[test]
    fn test_parse_rejects_duplicates_and_empty() {
        assert!(matches!(
            AxisOrder::parse("txx"),
            Err(Error::InvalidAxisSpec(_))
        ));
        assert!(matches!(AxisOrder::parse(""), Err(Error::InvalidAxisSpec(_))));
        assert!(matches!(
            AxisOrder::parse("t e"),
            Err(Error::InvalidAxisSpec(_))
        ));
    }

    #[test]
    fn test_permutation_to() {
        let order_in: AxisOrder = "texy".parse().unwrap();
        let order_out: AxisOrder = "etxy".parse().unwrap();
        assert_eq!(order_in.permutation_to(&order_out).unwrap(), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_permutation_to_rejects_foreign_tags() {
        let order_in: AxisOrder = "texy".parse().unwrap();
        let other: AxisOrder = "tezy".parse().unwrap();
        let shorter: AxisOrder = "tex".parse().unwrap();
        assert!(order_in.permutation_to(&other).is_err());
        assert!(order_in.permutation_to(&shorter).is_err());
    }
}
