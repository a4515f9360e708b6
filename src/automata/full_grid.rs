use log::{debug, trace};

use crate::{
    arrays::{NdArray, Square},
    coords::{Coordinates, PartialCoordinates},
    region::{Cone, Region},
    snapshot::{ModelKind, Persistent, Snapshot},
    Error, Result, Value,
};

use super::{
    rule::{neighbor_position, topple, Target},
    CellularAutomaton, FrontierPolicy, SimulationConfig, SymmetryFoldable, TotalValue, ValueAt,
};

const INITIAL_SIDE: usize = 5;

/// The automaton stored on a full square grid centered on the origin.
///
/// Every position of the grid is stored and stepped. This is the reference
/// against which the symmetry reduced [`SpreadIntegerValue`] is checked.
///
/// [`SpreadIntegerValue`]: super::SpreadIntegerValue
#[derive(Clone, Debug)]
pub struct SimpleSpreadIntegerValue {
    config: SimulationConfig,
    step: u64,
    grid: NdArray<Square>,
    /// The grid index of the lattice origin on every axis.
    origin: usize,
    bounds_reached: bool,
    discarded: Value,
}

/// `coordinates` moved by `offset` on every axis, if the result lies in
/// `0..side` on every axis.
fn translated(coordinates: &Coordinates, offset: isize, side: usize) -> Option<Coordinates> {
    let mut moved = Vec::with_capacity(coordinates.count());
    for c in coordinates.as_slice() {
        let c = c + offset;
        if c < 0 || c >= side as isize {
            return None;
        }
        moved.push(c);
    }
    Some(Coordinates::new(moved))
}

impl SimpleSpreadIntegerValue {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let shape = Square::new(config.dimension, INITIAL_SIDE)?;
        let mut grid = NdArray::filled(shape, config.background_value);

        let origin = (INITIAL_SIDE - 1) / 2;
        let center = Coordinates::new(vec![origin as isize; config.dimension]);
        grid.set(&center, config.initial_value);

        debug!(
            "Created {} grid of side {INITIAL_SIDE} in {} dimensions",
            Self::NAME,
            config.dimension
        );

        Ok(Self {
            config,
            step: 0,
            grid,
            origin,
            bounds_reached: false,
            discarded: 0,
        })
    }

    const NAME: &'static str = "SimpleSpreadIntegerValue";

    /// The side of the stored grid.
    pub fn side(&self) -> usize {
        self.grid.shape().side()
    }

    /// The grid index of the lattice origin on every axis.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The value that has flowed past a fixed frontier so far.
    pub fn discarded_value(&self) -> Value {
        self.discarded
    }

    pub fn grid(&self) -> &NdArray<Square> {
        &self.grid
    }

    /// `true` if toppling reached the frontier during the last step.
    pub fn bounds_reached(&self) -> bool {
        self.bounds_reached
    }
}

impl CellularAutomaton for SimpleSpreadIntegerValue {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn step(&self) -> u64 {
        self.step
    }

    fn next_step(&mut self) -> Result<bool> {
        let dimension = self.config.dimension;
        let background = self.config.background_value;
        let grow = self.config.frontier == FrontierPolicy::Grow;

        let side = self.side();
        let (new_side, offset) = if self.bounds_reached && grow {
            (side + 2, 1)
        } else {
            (side, 0)
        };

        let mut next = NdArray::new(Square::new(dimension, new_side)?);
        if offset != 0 && background != 0 {
            next.pad_edges(1, background)?;
        }

        let old = &self.grid;
        let last = side as isize - 1;
        let mut neighbors = Vec::with_capacity(2 * dimension);
        let mut changed = false;
        let mut bounds_reached = false;
        let mut discarded = 0;

        for c in old.shape().positions() {
            let value = old.get(&c);
            if value == 0 {
                continue;
            }

            neighbors.clear();
            let mut near_edge = false;
            for axis in 0..dimension {
                let x = c.get(axis);
                if x <= 1 || x >= last - 1 {
                    near_edge = true;
                }

                let upper = if x < last {
                    old.get(&c.offset(axis, 1))
                } else {
                    background
                };
                let lower = if x > 0 {
                    old.get(&c.offset(axis, -1))
                } else {
                    background
                };
                neighbors.push(upper);
                neighbors.push(lower);
            }

            let toppled = topple(value, &neighbors, |target, amount| {
                let destination = match target {
                    Target::Center => translated(&c, offset, new_side),
                    Target::Neighbor(i) => translated(&neighbor_position(&c, i), offset, new_side),
                };

                match destination {
                    Some(d) => {
                        next.add_and_get(&d, amount);
                    }
                    None => discarded += amount,
                }
            });

            if toppled {
                changed = true;
                if near_edge && grow {
                    bounds_reached = true;
                }
            }
        }

        if offset != 0 {
            debug!(
                "{} grew to side {new_side} at step {}",
                Self::NAME,
                self.step
            );
        }

        self.grid = next;
        self.origin += offset as usize;
        self.bounds_reached = bounds_reached;
        self.discarded += discarded;
        self.step += 1;

        trace!(
            "{} step {}: changed {changed}, discarded {discarded}",
            Self::NAME,
            self.step
        );

        Ok(changed)
    }
}

impl Region for SimpleSpreadIntegerValue {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn upper_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        (self.side() - 1 - self.origin) as isize
    }

    fn lower_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        -(self.origin as isize)
    }
}

impl ValueAt for SimpleSpreadIntegerValue {
    fn value_at(&self, coordinates: &Coordinates) -> Value {
        match translated(coordinates, self.origin as isize, self.side()) {
            Some(c) => self.grid.get(&c),
            None => self.config.background_value,
        }
    }
}

impl TotalValue for SimpleSpreadIntegerValue {
    fn total_value(&self) -> Value {
        self.grid.total()
    }
}

impl SymmetryFoldable for SimpleSpreadIntegerValue {
    fn asymmetric_region(&self) -> Cone {
        Cone::new(self.config.dimension, self.side() - self.origin)
    }
}

impl Persistent for SimpleSpreadIntegerValue {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            kind: ModelKind::FullGrid,
            config: self.config,
            step: self.step,
            side: self.side(),
            origin: self.origin,
            bounds_reached: self.bounds_reached,
            discarded: self.discarded,
            values: self.grid.values().to_vec(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        if snapshot.kind != ModelKind::FullGrid {
            return Err(Error::InvalidSnapshot(format!(
                "Expected a {} snapshot, found a {} one",
                ModelKind::FullGrid.name(),
                snapshot.kind.name()
            )));
        }
        snapshot.config.validate()?;

        if snapshot.origin >= snapshot.side {
            return Err(Error::InvalidSnapshot(format!(
                "Origin {} is outside of a grid of side {}",
                snapshot.origin, snapshot.side
            )));
        }

        let shape = Square::new(snapshot.config.dimension, snapshot.side)?;
        let grid = NdArray::from_values(shape, snapshot.values)?;

        Ok(Self {
            config: snapshot.config,
            step: snapshot.step,
            grid,
            origin: snapshot.origin,
            bounds_reached: snapshot.bounds_reached,
            discarded: snapshot.discarded,
        })
    }
}
