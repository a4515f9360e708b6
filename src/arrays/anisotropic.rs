use crate::{
    coords::{Coordinates, PartialCoordinates},
    region::{Cone, Region},
    Error, Result,
};

use super::{EdgePositions, Shape};

/// The amount of positions `side > c0 >= c1 >= ... >= c(dimension-1) >= 0`.
///
/// `cone_volume(1, k) = k` and `cone_volume(d, k)` is the sum of
/// `cone_volume(d - 1, i)` for `i` in `1..=k`. Returns `None` on overflow.
pub fn cone_volume(dimension: usize, side: usize) -> Option<usize> {
    if dimension == 0 {
        return Some(1);
    }
    let table = cone_volume_table(dimension, side)?;
    Some(table[dimension - 1][side])
}

/// `table[d - 1][k] == cone_volume(d, k)` for `d` in `1..=dimension` and
/// `k` in `0..=side`.
fn cone_volume_table(dimension: usize, side: usize) -> Option<Vec<Vec<usize>>> {
    let mut table: Vec<Vec<usize>> = Vec::with_capacity(dimension);
    table.push((0..=side).collect());

    for d in 1..dimension {
        let previous = &table[d - 1];
        let mut row = Vec::with_capacity(side + 1);
        let mut prefix: usize = 0;
        row.push(0);
        for k in 1..=side {
            prefix = prefix.checked_add(previous[k])?;
            row.push(prefix);
        }
        table.push(row);
    }

    Some(table)
}

/// The asymmetric section of a [`Square`](super::Square) shape that has
/// isotropic symmetry around the origin.
///
/// Only positions with `side > c0 >= c1 >= ... >= cn >= 0` are part of the
/// shape: one representative per orbit of the group of axis permutations
/// and sign flips. This needs roughly `side^n / n!` cells instead of `side^n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anisotropic {
    dimension: usize,
    side: usize,
    cone_volumes: Vec<Vec<usize>>,
}

impl Anisotropic {
    pub fn new(dimension: usize, side: usize) -> Result<Self> {
        if dimension < 1 {
            return Err(Error::InvalidDimension {
                got: dimension,
                min: 1,
            });
        }
        if side == 0 {
            return Err(Error::DegenerateShape { axis: 0 });
        }

        let cone_volumes = cone_volume_table(dimension, side).ok_or(Error::VolumeOverflow)?;

        Ok(Self {
            dimension,
            side,
            cone_volumes,
        })
    }

    /// The extent of the shape along axis 0.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Iterate over the positions in storage order.
    ///
    /// Unlike [`Region::positions`], the innermost axis is the last one, and
    /// the bound on axis `i` is the coordinate on axis `i - 1`. The `n`th
    /// position yielded is stored at index `n`.
    pub fn storage_order(&self) -> ConeWalk {
        ConeWalk::new(self.dimension, self.side, 0)
    }

    /// The region covered by the shape.
    pub fn cone(&self) -> Cone {
        Cone::new(self.dimension, self.side)
    }
}

impl Region for Anisotropic {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        self.cone().upper_bound(axis, coordinates)
    }

    fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        self.cone().lower_bound(axis, coordinates)
    }
}

impl Shape for Anisotropic {
    fn volume(&self) -> usize {
        self.cone_volumes[self.dimension - 1][self.side]
    }

    fn index(&self, coordinates: &Coordinates) -> usize {
        coordinates
            .as_slice()
            .iter()
            .enumerate()
            .map(|(axis, c)| self.cone_volumes[self.dimension - axis - 1][*c as usize])
            .sum()
    }

    /// Only the upper shell of axis 0 is an edge: every other axis is
    /// already bounded by the one before it.
    fn edge_positions(&self, width: usize) -> Result<EdgePositions<'_>> {
        if width < 1 {
            return Err(Error::InvalidEdgeWidth);
        }

        let first = self.side.saturating_sub(width);
        Ok(Box::new(ConeWalk::new(self.dimension, self.side, first)))
    }
}

/// Walks the cone `side > c0 >= c1 >= ... >= cn >= 0` with the last axis
/// innermost, starting at `c0 == first`.
pub struct ConeWalk {
    coords: Vec<isize>,
    side: isize,
    started: bool,
    done: bool,
}

impl ConeWalk {
    fn new(dimension: usize, side: usize, first: usize) -> Self {
        let mut coords = vec![0; dimension];
        coords[0] = first as isize;

        Self {
            coords,
            side: side as isize,
            started: false,
            done: first >= side,
        }
    }
}

impl Iterator for ConeWalk {
    type Item = Coordinates;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some(Coordinates::new(self.coords.clone()));
        }

        for axis in (0..self.coords.len()).rev() {
            let max = if axis == 0 {
                self.side - 1
            } else {
                self.coords[axis - 1]
            };

            if self.coords[axis] < max {
                self.coords[axis] += 1;
                self.coords[axis + 1..].iter_mut().for_each(|c| *c = 0);
                return Some(Coordinates::new(self.coords.clone()));
            }
        }

        self.done = true;
        None
    }
}
