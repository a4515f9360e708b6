use crate::{
    coords::{Coordinates, PartialCoordinates},
    region::{BoundsRegion, Region},
    Error, Result,
};

use super::{EdgePositions, Shape};

/// A rectangle-like shape with an arbitrary extent on every axis.
///
/// Positions are flattened in mixed radix, axis 0 varying fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rectangular {
    sizes: Vec<usize>,
    strides: Vec<usize>,
    volume: usize,
}

impl Rectangular {
    /// Create a shape with `sizes[i]` positions on axis `i`.
    ///
    /// The dimension of the shape is the length of `sizes`.
    pub fn new(sizes: Vec<usize>) -> Result<Self> {
        if let Some(axis) = sizes.iter().position(|s| *s == 0) {
            return Err(Error::DegenerateShape { axis });
        }

        let mut strides = Vec::with_capacity(sizes.len());
        let mut volume: usize = 1;
        for size in &sizes {
            strides.push(volume);
            volume = volume.checked_mul(*size).ok_or(Error::VolumeOverflow)?;
        }

        Ok(Self {
            sizes,
            strides,
            volume,
        })
    }

    /// The extent of the shape on `axis`.
    pub fn size(&self, axis: usize) -> usize {
        self.sizes[axis]
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Split the outer shell of width `width` into disjoint boxes.
    fn edge_boxes(&self, width: usize) -> Vec<BoundsRegion> {
        let width = width as isize;
        let mut upper: Vec<isize> = self.sizes.iter().map(|s| *s as isize - 1).collect();
        let mut lower = vec![0; self.sizes.len()];
        let mut boxes = Vec::with_capacity(2 * self.sizes.len());

        for axis in 0..self.sizes.len() {
            // low side
            let real_upper = upper[axis];
            upper[axis] = width - 1;
            boxes.push(BoundsRegion::new(lower.clone(), upper.clone()));
            upper[axis] = real_upper;

            // high side
            lower[axis] = upper[axis] - (width - 1);
            boxes.push(BoundsRegion::new(lower.clone(), upper.clone()));

            // the remaining axes only walk the inner slab
            upper[axis] = lower[axis] - 1;
            lower[axis] = width;
        }

        boxes
    }
}

impl Region for Rectangular {
    fn dimension(&self) -> usize {
        self.sizes.len()
    }

    fn upper_bound(&self, axis: usize, _: &PartialCoordinates) -> isize {
        self.sizes[axis] as isize - 1
    }

    fn lower_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        0
    }
}

impl Shape for Rectangular {
    fn volume(&self) -> usize {
        self.volume
    }

    fn index(&self, coordinates: &Coordinates) -> usize {
        coordinates
            .as_slice()
            .iter()
            .zip(&self.strides)
            .map(|(c, stride)| *c as usize * stride)
            .sum()
    }

    fn edge_positions(&self, width: usize) -> Result<EdgePositions<'_>> {
        if width < 1 {
            return Err(Error::InvalidEdgeWidth);
        }

        let thin = self.sizes.is_empty() || self.sizes.iter().any(|s| *s <= 2 * width);
        if thin {
            return Ok(Box::new(self.positions()));
        }

        let boxes = self.edge_boxes(width);
        Ok(Box::new(
            boxes.into_iter().flat_map(BoundsRegion::into_positions),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::is_bijective;

    #[test]
    fn mixed_radix_index() {
        let shape = Rectangular::new(vec![3, 4, 2]).unwrap();

        assert_eq!(shape.volume(), 24);
        assert_eq!(shape.index(&[0, 0, 0].into()), 0);
        assert_eq!(shape.index(&[1, 0, 0].into()), 1);
        assert_eq!(shape.index(&[0, 1, 0].into()), 3);
        assert_eq!(shape.index(&[2, 3, 1].into()), 23);
    }

    #[test]
    fn positions_follow_storage_order() {
        let shape = Rectangular::new(vec![2, 3]).unwrap();
        let indexes: Vec<_> = shape.positions().map(|c| shape.index(&c)).collect();
        assert_eq!(indexes, (0..6).collect::<Vec<_>>());
        assert!(is_bijective(&shape));
    }

    #[test]
    fn zero_extent_is_rejected() {
        assert!(matches!(
            Rectangular::new(vec![3, 0, 2]),
            Err(Error::DegenerateShape { axis: 1 })
        ));
    }

    #[test]
    fn overflowing_volume_is_rejected() {
        assert!(matches!(
            Rectangular::new(vec![usize::MAX, 2]),
            Err(Error::VolumeOverflow)
        ));
    }

    #[test]
    fn edge_shell() {
        let shape = Rectangular::new(vec![5, 6]).unwrap();
        let edges: Vec<_> = shape.edge_positions(1).unwrap().collect();

        // everything but the 3x4 interior
        assert_eq!(edges.len(), 30 - 12);

        let unique: std::collections::HashSet<_> = edges.iter().collect();
        assert_eq!(unique.len(), edges.len());

        for c in &edges {
            let on_edge = (0..2).any(|axis| c.get(axis) == 0 || c.get(axis) == shape.size(axis) as isize - 1);
            assert!(on_edge, "{c} is not on the edge");
        }
    }

    #[test]
    fn thin_shapes_are_all_edge() {
        let shape = Rectangular::new(vec![4, 9]).unwrap();
        assert_eq!(shape.edge_positions(2).unwrap().count(), 36);
        assert!(matches!(
            shape.edge_positions(0).map(|_| ()),
            Err(Error::InvalidEdgeWidth)
        ));
    }
}
