use std::fmt;
use std::ops::Index;

use crate::error::KdTreeError;

/// An owned point with a fixed number of `f64` coordinates.
///
/// Points are immutable once built. The tree copies the caller's coordinates on insertion
/// and hands out fresh copies from queries, so a returned `Point` never aliases tree storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    coords: Box<[f64]>,
}

impl Point {
    /// Creates a point owning a copy of `coords`.
    ///
    /// The length is not validated here; matching it against a tree's dimensionality is
    /// the tree's job.
    pub fn new(coords: &[f64]) -> Self {
        Point { coords: coords.into() }
    }

    /// Like [`Point::new`], but reports an exhausted allocator instead of aborting.
    pub(crate) fn try_new(coords: &[f64]) -> Result<Self, KdTreeError> {
        let mut storage = Vec::new();
        storage.try_reserve_exact(coords.len())?;
        storage.extend_from_slice(coords);
        Ok(Point { coords: storage.into_boxed_slice() })
    }

    /// The coordinates of this point.
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Number of coordinates.
    pub fn dimensions(&self) -> usize {
        self.coords.len()
    }

    /// Squared Euclidean distance to `other`.
    ///
    /// Both points must have the same number of coordinates. Inside a tree this always holds;
    /// a mismatch is a caller defect and trips a debug assertion.
    pub fn distance_squared(&self, other: &Point) -> f64 {
        squared_distance(&self.coords, &other.coords)
    }
}

/// Squared Euclidean distance between two equal-length coordinate slices.
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "coordinate lengths differ");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, axis: usize) -> &f64 {
        &self.coords[axis]
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Point { coords: coords.into_boxed_slice() }
    }
}

impl<const D: usize> From<[f64; D]> for Point {
    fn from(coords: [f64; D]) -> Self {
        Point::new(&coords)
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        &self.coords
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = Point::new(&[1.0, 2.0, 3.0]);
        assert_eq!(a.distance_squared(&Point::new(&[1.0, 2.0, 3.0])), 0.0);
        assert_eq!(a.distance_squared(&Point::new(&[1.0, 2.0, 4.0])), 1.0);

        let origin = Point::from([0.0, 0.0]);
        assert_eq!(origin.distance_squared(&Point::from([3.0, 4.0])), 25.0);
    }

    #[test]
    fn test_point_is_a_copy() {
        let mut coords = vec![1.5, -2.0];
        let p = Point::new(&coords);
        coords[0] = 100.0;
        assert_eq!(p.coords(), &[1.5, -2.0]);
        assert_eq!(p[1], -2.0);
        assert_eq!(p.dimensions(), 2);
    }

    #[test]
    fn test_display() {
        let p = Point::from(vec![5.0, 4.0]);
        assert_eq!(p.to_string(), "(5, 4)");
        assert_eq!(Point::new(&[0.5]).to_string(), "(0.5)");
    }

    #[test]
    fn test_try_new_matches_new() {
        let coords = [0.25, 7.0, -3.5];
        let p = Point::try_new(&coords).expect("small allocation");
        assert_eq!(p, Point::new(&coords));
    }
}
