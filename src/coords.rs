//! Lattice coordinates.

use std::fmt;

/// An immutable position on the lattice Z^n.
///
/// The number of coordinates must match the dimension of whatever shape
/// or region it is used with. This is a precondition, not a checked failure.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Coordinates {
    coords: Box<[isize]>,
}

impl Coordinates {
    pub fn new(coords: Vec<isize>) -> Self {
        Self {
            coords: coords.into_boxed_slice(),
        }
    }

    /// The origin of Z^`dimension`.
    pub fn origin(dimension: usize) -> Self {
        Self::new(vec![0; dimension])
    }

    /// The amount of coordinates, i.e. the dimension of the lattice.
    pub fn count(&self) -> usize {
        self.coords.len()
    }

    pub fn get(&self, axis: usize) -> isize {
        self.coords[axis]
    }

    pub fn as_slice(&self) -> &[isize] {
        &self.coords
    }

    pub fn to_vec(&self) -> Vec<isize> {
        self.coords.to_vec()
    }

    /// A copy of `self` with the coordinate on `axis` replaced by `value`.
    pub fn with(&self, axis: usize, value: isize) -> Self {
        let mut coords = self.coords.clone();
        coords[axis] = value;
        Self { coords }
    }

    /// A copy of `self` moved `delta` units along `axis`.
    pub fn offset(&self, axis: usize, delta: isize) -> Self {
        self.with(axis, self.coords[axis] + delta)
    }

    pub fn sum(&self) -> isize {
        self.coords.iter().sum()
    }

    /// `true` if the coordinates add up to an even number.
    pub fn is_even(&self) -> bool {
        is_even_position(&self.coords)
    }

    /// `true` if `self` lies in the cone `c0 >= c1 >= ... >= cn >= 0`.
    pub fn is_in_cone(&self) -> bool {
        is_in_cone(&self.coords)
    }

    /// The representative of the symmetry orbit of `self`: absolute values
    /// sorted in descending order.
    pub fn folded(&self) -> Self {
        let mut coords = self.coords.to_vec();
        fold_in_place(&mut coords);
        Self::new(coords)
    }
}

impl From<Vec<isize>> for Coordinates {
    fn from(value: Vec<isize>) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<[isize; N]> for Coordinates {
    fn from(value: [isize; N]) -> Self {
        Self::new(value.to_vec())
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

/// Coordinates where some axes may be left unbound.
///
/// Used to query the local bounds of a region on one axis given the
/// coordinates already fixed on other axes.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct PartialCoordinates {
    coords: Vec<Option<isize>>,
}

impl PartialCoordinates {
    pub fn new(coords: Vec<Option<isize>>) -> Self {
        Self { coords }
    }

    /// Partial coordinates with every axis unbound.
    pub fn unbound(dimension: usize) -> Self {
        Self {
            coords: vec![None; dimension],
        }
    }

    pub fn count(&self) -> usize {
        self.coords.len()
    }

    /// The coordinate on `axis`, or `None` if it is unbound.
    pub fn get(&self, axis: usize) -> Option<isize> {
        self.coords[axis]
    }

    /// The nearest bound axis below `axis` and its coordinate.
    pub fn nearest_below(&self, axis: usize) -> Option<(usize, isize)> {
        (0..axis)
            .rev()
            .find_map(|i| self.coords[i].map(|c| (i, c)))
    }

    /// The nearest bound axis above `axis` and its coordinate.
    pub fn nearest_above(&self, axis: usize) -> Option<(usize, isize)> {
        (axis + 1..self.coords.len()).find_map(|i| self.coords[i].map(|c| (i, c)))
    }

    pub(crate) fn bind(&mut self, axis: usize, value: isize) {
        self.coords[axis] = Some(value);
    }

    pub(crate) fn unbind(&mut self, axis: usize) {
        self.coords[axis] = None;
    }
}

impl From<&Coordinates> for PartialCoordinates {
    fn from(value: &Coordinates) -> Self {
        Self {
            coords: value.as_slice().iter().map(|c| Some(*c)).collect(),
        }
    }
}

pub fn is_even_position(coords: &[isize]) -> bool {
    coords.iter().sum::<isize>().rem_euclid(2) == 0
}

pub fn is_sorted_descending(coords: &[isize]) -> bool {
    coords.windows(2).all(|w| w[0] >= w[1])
}

pub fn are_all_non_negative(coords: &[isize]) -> bool {
    coords.iter().all(|c| *c >= 0)
}

pub fn is_in_cone(coords: &[isize]) -> bool {
    are_all_non_negative(coords) && is_sorted_descending(coords)
}

/// Replace every coordinate by its absolute value and sort descending.
pub fn fold_in_place(coords: &mut [isize]) {
    coords.iter_mut().for_each(|c| *c = c.abs());
    coords.sort_unstable_by(|a, b| b.cmp(a));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_sorts_absolute_values() {
        let c = Coordinates::from([-1, 3, 0, -3]);
        assert_eq!(c.folded(), Coordinates::from([3, 3, 1, 0]));
        assert!(c.folded().is_in_cone());
        assert!(!c.is_in_cone());
    }

    #[test]
    fn parity_of_negative_sums() {
        assert!(Coordinates::from([-1, -1]).is_even());
        assert!(!Coordinates::from([-1, 0, 0]).is_even());
    }

    #[test]
    fn nearest_bound_axes() {
        let p = PartialCoordinates::new(vec![Some(4), None, None, Some(1)]);
        assert_eq!(p.nearest_below(2), Some((0, 4)));
        assert_eq!(p.nearest_above(1), Some((3, 1)));
        assert_eq!(p.nearest_above(3), None);
        assert_eq!(p.nearest_below(0), None);
    }

    #[test]
    fn display() {
        assert_eq!(Coordinates::from([1, -2]).to_string(), "(1, -2)");
        assert_eq!(Coordinates::origin(0).to_string(), "()");
    }
}
