//! The bounds protocol used to walk regions of the lattice.
//!
//! A region describes itself one axis at a time: given the coordinates
//! already fixed on some axes, it reports the local lower and upper bound
//! on another one. Enumeration asks for these bounds outside-in, from the
//! highest axis down to axis 0, so the bound on an axis may depend on the
//! coordinates of the axes above it. This is enough to describe regions
//! such as the cone `c0 >= c1 >= ... >= cn >= 0` that are not rectangular.

use crate::coords::{Coordinates, PartialCoordinates};

mod positions;
pub use positions::{Parity, Positions};

/// A region of the lattice whose shape is such that no line parallel
/// to an axis crosses its bounds in more than two places.
pub trait Region {
    fn dimension(&self) -> usize;

    /// The local upper bound on `axis`, given the coordinates bound in
    /// `coordinates`. The slot for `axis` itself is ignored.
    ///
    /// Calling this with coordinates outside the region is not defined.
    fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize;

    /// The local lower bound on `axis`, given the coordinates bound in
    /// `coordinates`. The slot for `axis` itself is ignored.
    fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize;

    /// The upper bound on `axis` over the whole region.
    fn global_upper_bound(&self, axis: usize) -> isize {
        self.upper_bound(axis, &PartialCoordinates::unbound(self.dimension()))
    }

    /// The lower bound on `axis` over the whole region.
    fn global_lower_bound(&self, axis: usize) -> isize {
        self.lower_bound(axis, &PartialCoordinates::unbound(self.dimension()))
    }

    /// Check whether `coordinates` lies within the region, querying the
    /// bounds outside-in the same way enumeration does.
    fn contains(&self, coordinates: &Coordinates) -> bool {
        let dimension = self.dimension();
        let mut partial = PartialCoordinates::unbound(dimension);

        for axis in (0..dimension).rev() {
            let c = coordinates.get(axis);
            if c < self.lower_bound(axis, &partial) || c > self.upper_bound(axis, &partial) {
                return false;
            }
            partial.bind(axis, c);
        }

        true
    }

    /// Iterate over every position of the region.
    fn positions(&self) -> Positions<&Self>
    where
        Self: Sized,
    {
        Positions::new(self, Parity::Any)
    }

    /// Iterate over the positions of the region whose coordinates add up
    /// to an even number.
    fn even_positions(&self) -> Positions<&Self>
    where
        Self: Sized,
    {
        Positions::new(self, Parity::Even)
    }

    /// Iterate over the positions of the region whose coordinates add up
    /// to an odd number.
    fn odd_positions(&self) -> Positions<&Self>
    where
        Self: Sized,
    {
        Positions::new(self, Parity::Odd)
    }
}

impl<R> Region for &R
where
    R: Region + ?Sized,
{
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        (**self).upper_bound(axis, coordinates)
    }

    fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        (**self).lower_bound(axis, coordinates)
    }
}

/// An axis-aligned box with explicit inclusive bounds on every axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundsRegion {
    lower: Vec<isize>,
    upper: Vec<isize>,
}

impl BoundsRegion {
    /// Create a box spanning `lower[i]..=upper[i]` on every axis `i`.
    ///
    /// Both vectors must have the same length. An axis with
    /// `lower > upper` makes the box empty.
    pub fn new(lower: Vec<isize>, upper: Vec<isize>) -> Self {
        assert_eq!(lower.len(), upper.len(), "Bounds must have the same dimension");
        Self { lower, upper }
    }

    /// The box `-radius..=radius` on every axis.
    pub fn centered(dimension: usize, radius: isize) -> Self {
        Self::new(vec![-radius; dimension], vec![radius; dimension])
    }

    /// The smallest box containing the global bounds of both regions.
    pub fn enclosing(a: &impl Region, b: &impl Region) -> Self {
        let dimension = a.dimension();
        assert_eq!(dimension, b.dimension());

        let lower = (0..dimension)
            .map(|axis| a.global_lower_bound(axis).min(b.global_lower_bound(axis)))
            .collect();
        let upper = (0..dimension)
            .map(|axis| a.global_upper_bound(axis).max(b.global_upper_bound(axis)))
            .collect();

        Self { lower, upper }
    }

    /// Iterate over every position of the box, without borrowing it.
    pub fn into_positions(self) -> Positions<Self> {
        Positions::new(self, Parity::Any)
    }
}

impl Region for BoundsRegion {
    fn dimension(&self) -> usize {
        self.lower.len()
    }

    fn upper_bound(&self, axis: usize, _: &PartialCoordinates) -> isize {
        self.upper[axis]
    }

    fn lower_bound(&self, axis: usize, _: &PartialCoordinates) -> isize {
        self.lower[axis]
    }
}

/// The cone `side > c0 >= c1 >= ... >= cn >= 0`: one representative per
/// orbit of the axis permutations and sign flips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cone {
    dimension: usize,
    side: usize,
}

impl Cone {
    pub fn new(dimension: usize, side: usize) -> Self {
        Self { dimension, side }
    }

    pub fn side(&self) -> usize {
        self.side
    }
}

impl Region for Cone {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        match coordinates.nearest_below(axis) {
            Some((_, c)) => c,
            None => self.side as isize - 1,
        }
    }

    fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        match coordinates.nearest_above(axis) {
            Some((_, c)) => c,
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The triangle `0 <= y <= x <= size - 1`, described from either side.
    struct Triangle {
        size: isize,
    }

    impl Region for Triangle {
        fn dimension(&self) -> usize {
            2
        }

        fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
            match (axis, coordinates.get(0)) {
                (1, Some(x)) => x,
                _ => self.size - 1,
            }
        }

        fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
            match (axis, coordinates.get(1)) {
                (0, Some(y)) => y,
                _ => 0,
            }
        }
    }

    #[test]
    fn box_positions_are_in_odometer_order() {
        let region = BoundsRegion::new(vec![-1, 0], vec![0, 1]);
        let positions: Vec<_> = region.positions().collect();

        let expected: Vec<Coordinates> = vec![
            [-1, 0].into(),
            [0, 0].into(),
            [-1, 1].into(),
            [0, 1].into(),
        ];

        assert_eq!(positions, expected);
    }

    #[test]
    fn empty_box() {
        let region = BoundsRegion::new(vec![0, 3], vec![2, 2]);
        assert_eq!(region.positions().count(), 0);
        assert_eq!(region.even_positions().count(), 0);
    }

    #[test]
    fn zero_dimensional_box() {
        let region = BoundsRegion::new(vec![], vec![]);
        assert_eq!(region.positions().count(), 1);
        assert_eq!(region.even_positions().count(), 1);
        assert_eq!(region.odd_positions().count(), 0);
    }

    #[test]
    fn triangle_walk() {
        let triangle = Triangle { size: 4 };
        let positions: Vec<_> = triangle.positions().collect();

        assert_eq!(positions.len(), 10);
        assert!(positions.iter().all(|c| c.get(0) >= c.get(1) && c.get(1) >= 0));
        assert!(positions.iter().all(|c| triangle.contains(c)));
        assert!(!triangle.contains(&[1, 2].into()));
    }

    #[test]
    fn triangle_parity_walks_partition_the_region() {
        let triangle = Triangle { size: 5 };

        let even: Vec<_> = triangle.even_positions().collect();
        let odd: Vec<_> = triangle.odd_positions().collect();

        assert!(even.iter().all(Coordinates::is_even));
        assert!(odd.iter().all(|c| !c.is_even()));
        assert_eq!(even.len() + odd.len(), triangle.positions().count());
    }

    #[test]
    fn centered_box_parity_split() {
        let region = BoundsRegion::centered(3, 2);

        let even = region.even_positions().count();
        let odd = region.odd_positions().count();

        assert_eq!(even + odd, 125);
        assert!(even.abs_diff(odd) <= 1);
    }

    #[test]
    fn cone_walk() {
        let cone = Cone::new(3, 3);
        let positions: Vec<_> = cone.positions().collect();

        assert_eq!(positions.len(), 10);
        assert!(positions.iter().all(Coordinates::is_in_cone));
        assert!(!cone.contains(&[1, 2, 0].into()));
        assert_eq!(Cone::new(2, 0).positions().count(), 0);
    }

    #[test]
    fn enclosing_box() {
        let a = BoundsRegion::new(vec![-1, 0], vec![1, 5]);
        let b = BoundsRegion::new(vec![-3, 2], vec![0, 2]);

        assert_eq!(
            BoundsRegion::enclosing(&a, &b),
            BoundsRegion::new(vec![-3, 0], vec![1, 5])
        );
    }
}
