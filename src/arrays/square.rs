use crate::{
    coords::{Coordinates, PartialCoordinates},
    region::Region,
    Result,
};

use super::{EdgePositions, Rectangular, Shape};

/// A square-like shape: `dimension` axes, all with extent `side`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Square {
    side: usize,
    inner: Rectangular,
}

impl Square {
    pub fn new(dimension: usize, side: usize) -> Result<Self> {
        let inner = Rectangular::new(vec![side; dimension])?;
        Ok(Self { side, inner })
    }

    pub fn side(&self) -> usize {
        self.side
    }
}

impl Region for Square {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn upper_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        self.side as isize - 1
    }

    fn lower_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        0
    }
}

impl Shape for Square {
    fn volume(&self) -> usize {
        self.inner.volume()
    }

    fn index(&self, coordinates: &Coordinates) -> usize {
        self.inner.index(coordinates)
    }

    fn edge_positions(&self, width: usize) -> Result<EdgePositions<'_>> {
        self.inner.edge_positions(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arrays::is_bijective, Error};

    #[test]
    fn volume_is_a_power_of_the_side() {
        let shape = Square::new(3, 4).unwrap();
        assert_eq!(shape.volume(), 64);
        assert_eq!(shape.positions().count(), 64);
        assert!(is_bijective(&shape));
    }

    #[test]
    fn zero_dimensional_square_has_one_cell() {
        let shape = Square::new(0, 7).unwrap();
        assert_eq!(shape.volume(), 1);
        assert_eq!(shape.positions().count(), 1);
    }

    #[test]
    fn zero_side_is_degenerate() {
        assert!(matches!(
            Square::new(2, 0),
            Err(Error::DegenerateShape { axis: 0 })
        ));
    }

    #[test]
    fn parity_split() {
        for side in 1..6 {
            let shape = Square::new(2, side).unwrap();
            let even: Vec<_> = shape.even_positions().collect();
            let odd: Vec<_> = shape.odd_positions().collect();

            assert!(even.len().abs_diff(odd.len()) <= 1);
            assert_eq!(even.len() + odd.len(), shape.volume());
            assert!(even.iter().all(Coordinates::is_even));
            assert!(odd.iter().all(|c| !c.is_even()));
        }
    }

    #[test]
    fn edge_of_cube() {
        let shape = Square::new(3, 5).unwrap();
        assert_eq!(shape.edge_positions(1).unwrap().count(), 125 - 27);
    }
}
