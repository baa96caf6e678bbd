//! Integer geometry in database units.
//!
//! Placement coordinates come from the placed-netlist reader as integer
//! database units (DBU). Wire lengths are Manhattan distances in DBU and
//! are converted to meters only when electrical quantities are computed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2-D point in database units.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in DBU.
    pub x: i64,
    /// Y coordinate in DBU.
    pub y: i64,
}

impl Point {
    /// Creates a point from DBU coordinates.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the Manhattan (rectilinear) distance to `other` in DBU.
    pub fn manhattan_distance(self, other: Point) -> i64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_axis_aligned() {
        let a = Point::new(0, 0);
        let b = Point::new(1000, 0);
        assert_eq!(a.manhattan_distance(b), 1000);
        assert_eq!(b.manhattan_distance(a), 1000);
    }

    #[test]
    fn manhattan_distance_diagonal() {
        let a = Point::new(-200, 300);
        let b = Point::new(100, -100);
        assert_eq!(a.manhattan_distance(b), 300 + 400);
    }

    #[test]
    fn zero_distance() {
        let p = Point::new(42, 42);
        assert_eq!(p.manhattan_distance(p), 0);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Point::new(3, -4)), "(3, -4)");
    }

    #[test]
    fn serde_roundtrip() {
        let p = Point::new(123_456, -789);
        let json = serde_json::to_string(&p).unwrap();
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
