use crate::coords::{is_even_position, Coordinates, PartialCoordinates};

use super::Region;

/// Which positions of a region an enumeration yields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    Any,
    /// Positions whose coordinates add up to an even number.
    Even,
    /// Positions whose coordinates add up to an odd number.
    Odd,
}

impl Parity {
    fn stride(self) -> isize {
        match self {
            Parity::Any => 1,
            Parity::Even | Parity::Odd => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Fresh,
    Running,
    Done,
}

/// An iterator over the positions of a [`Region`].
///
/// This is an odometer: axis 0 advances up to its local upper bound, then
/// carries into axis 1 and so on. Every time an axis changes, the bounds
/// of all the axes below it are queried again with the coordinates fixed
/// so far, which is what allows walking non-rectangular regions.
///
/// The walk reflects the region as it was when iteration started.
pub struct Positions<R> {
    region: R,
    parity: Parity,
    coords: Vec<isize>,
    upper: Vec<isize>,
    partial: PartialCoordinates,
    state: State,
}

impl<R> Positions<R>
where
    R: Region,
{
    pub fn new(region: R, parity: Parity) -> Self {
        let dimension = region.dimension();
        Self {
            region,
            parity,
            coords: vec![0; dimension],
            upper: vec![0; dimension],
            partial: PartialCoordinates::unbound(dimension),
            state: State::Fresh,
        }
    }

    /// Set every axis below `top` to its lowest admissible value.
    ///
    /// Returns the axis whose local range turned out empty, if any.
    fn fill_below(&mut self, top: usize) -> Result<(), usize> {
        for axis in 0..top {
            self.partial.unbind(axis);
        }

        for axis in (0..top).rev() {
            let mut lower = self.region.lower_bound(axis, &self.partial);
            let upper = self.region.upper_bound(axis, &self.partial);

            if axis == 0 && self.parity != Parity::Any {
                let higher: isize = self.coords[1..].iter().sum();
                let even = (higher + lower).rem_euclid(2) == 0;
                if even != (self.parity == Parity::Even) {
                    lower += 1;
                }
            }

            if lower > upper {
                return Err(axis);
            }

            self.coords[axis] = lower;
            self.upper[axis] = upper;
            self.partial.bind(axis, lower);
        }

        Ok(())
    }

    /// Advance `axis`, carrying into higher axes on overflow.
    ///
    /// Returns `false` once every axis has overflowed.
    fn carry(&mut self, mut axis: usize) -> bool {
        let dimension = self.coords.len();

        while axis < dimension {
            let step = if axis == 0 { self.parity.stride() } else { 1 };
            let next = self.coords[axis] + step;

            if next <= self.upper[axis] {
                self.coords[axis] = next;
                self.partial.bind(axis, next);
                match self.fill_below(axis) {
                    Ok(()) => return true,
                    Err(empty) => axis = empty + 1,
                }
            } else {
                axis += 1;
            }
        }

        false
    }
}

impl<R> Iterator for Positions<R>
where
    R: Region,
{
    type Item = Coordinates;

    fn next(&mut self) -> Option<Self::Item> {
        let dimension = self.coords.len();

        let found = match self.state {
            State::Done => false,
            State::Fresh if dimension == 0 => {
                // The only point of Z^0 has an even (empty) sum
                self.state = State::Done;
                return (self.parity != Parity::Odd).then(|| Coordinates::origin(0));
            }
            State::Fresh => match self.fill_below(dimension) {
                Ok(()) => true,
                Err(empty) => self.carry(empty + 1),
            },
            State::Running => self.carry(0),
        };

        if found {
            self.state = State::Running;
            debug_assert!(match self.parity {
                Parity::Any => true,
                Parity::Even => is_even_position(&self.coords),
                Parity::Odd => !is_even_position(&self.coords),
            });
            Some(Coordinates::new(self.coords.clone()))
        } else {
            self.state = State::Done;
            None
        }
    }
}
