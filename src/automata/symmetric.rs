use log::{debug, trace};

use crate::{
    arrays::{Anisotropic, NdArray},
    coords::{Coordinates, PartialCoordinates},
    region::{Cone, Region},
    snapshot::{ModelKind, Persistent, Snapshot},
    Error, Result, Value,
};

use super::{
    rule::{neighbor_position, topple, Target},
    CellularAutomaton, FrontierPolicy, SimulationConfig, SymmetryFoldable, TotalValue, ValueAt,
};

const INITIAL_SIDE: usize = 3;

/// The amount of positions in the orbit of `representative` under axis
/// permutations and sign flips: the distinct orderings of its coordinates
/// times two for every non-zero coordinate.
///
/// `representative` must lie in the cone.
pub fn orbit_size(representative: &Coordinates) -> Value {
    let coords = representative.as_slice();

    let mut size: Value = 1;
    let mut placed: Value = 0;
    let mut run: Value = 0;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 && coords[i - 1] == *c {
            run += 1;
        } else {
            run = 1;
        }
        placed += 1;
        // multinomial coefficient, one factor at a time
        size = size * placed / run;
        if *c != 0 {
            size *= 2;
        }
    }

    size
}

/// The positions whose toppling can reach the cone of a grid with side
/// `side`: the cone itself and its neighbours.
///
/// `-1 <= x0 < side` and `-1 <= xi <= x(i-1) + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConeNeighbourhood {
    dimension: usize,
    side: usize,
}

impl ConeNeighbourhood {
    pub fn new(dimension: usize, side: usize) -> Self {
        Self { dimension, side }
    }
}

impl Region for ConeNeighbourhood {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn upper_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        match coordinates.nearest_below(axis) {
            Some((below, c)) => c + (axis - below) as isize,
            None => self.side as isize - 1 + axis as isize,
        }
    }

    fn lower_bound(&self, axis: usize, coordinates: &PartialCoordinates) -> isize {
        match coordinates.nearest_above(axis) {
            Some((above, c)) => (c - (above - axis) as isize).max(-1),
            None => -1,
        }
    }
}

/// The automaton stored only on the cone `c0 >= c1 >= ... >= cn >= 0`.
///
/// Every other position holds the value of its representative in the cone,
/// which is sound because the toppling rule commutes with axis permutations
/// and sign flips. This needs roughly `1 / (n! 2^n)` of the cells of
/// [`SimpleSpreadIntegerValue`] and steps to the same values.
///
/// [`SimpleSpreadIntegerValue`]: super::SimpleSpreadIntegerValue
#[derive(Clone, Debug)]
pub struct SpreadIntegerValue {
    config: SimulationConfig,
    step: u64,
    grid: NdArray<Anisotropic>,
    bounds_reached: bool,
    discarded: Value,
}

impl SpreadIntegerValue {
    const NAME: &'static str = "SpreadIntegerValue";

    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let shape = Anisotropic::new(config.dimension, INITIAL_SIDE)?;
        let mut grid = NdArray::filled(shape, config.background_value);
        grid.set(&Coordinates::origin(config.dimension), config.initial_value);

        debug!(
            "Created {} grid of side {INITIAL_SIDE} in {} dimensions",
            Self::NAME,
            config.dimension
        );

        Ok(Self {
            config,
            step: 0,
            grid,
            bounds_reached: false,
            discarded: 0,
        })
    }

    /// The extent of the stored cone along axis 0.
    pub fn side(&self) -> usize {
        self.grid.shape().side()
    }

    /// The value that has flowed past a fixed frontier so far, counted over
    /// the whole lattice.
    pub fn discarded_value(&self) -> Value {
        self.discarded
    }

    pub fn grid(&self) -> &NdArray<Anisotropic> {
        &self.grid
    }

    /// `true` if toppling reached the frontier during the last step.
    pub fn bounds_reached(&self) -> bool {
        self.bounds_reached
    }

    fn weighted_total(grid: &NdArray<Anisotropic>) -> Value {
        grid.shape()
            .storage_order()
            .zip(grid.values())
            .map(|(c, v)| v * orbit_size(&c))
            .sum()
    }
}

impl CellularAutomaton for SpreadIntegerValue {
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
        let new_side = if self.bounds_reached && grow {
            side + 1
        } else {
            side
        };

        let mut next = NdArray::new(Anisotropic::new(dimension, new_side)?);
        if new_side != side && background != 0 {
            next.pad_edges(1, background)?;
        }

        let edge = side as isize - 2;
        let mut neighbors = Vec::with_capacity(2 * dimension);
        let mut changed = false;
        let mut bounds_reached = false;

        for x in ConeNeighbourhood::new(dimension, side).positions() {
            let folded = x.folded();
            // Positions past the stored frontier do not topple
            if folded.get(0) >= side as isize {
                continue;
            }

            let value = self.grid.get(&folded);
            if value == 0 {
                continue;
            }

            neighbors.clear();
            for axis in 0..dimension {
                neighbors.push(self.value_at(&x.offset(axis, 1)));
                neighbors.push(self.value_at(&x.offset(axis, -1)));
            }

            let toppled = topple(value, &neighbors, |target, amount| {
                let destination = match target {
                    Target::Center => x.clone(),
                    Target::Neighbor(i) => neighbor_position(&x, i),
                };

                // Any other destination is covered by its representative
                if destination.is_in_cone() && destination.get(0) < new_side as isize {
                    next.add_and_get(&destination, amount);
                }
            });

            if toppled {
                changed = true;
                if folded.get(0) >= edge && grow {
                    bounds_reached = true;
                }
            }
        }

        if new_side != side {
            debug!(
                "{} grew to side {new_side} at step {}",
                Self::NAME,
                self.step
            );
        }

        if !grow {
            self.discarded += Self::weighted_total(&self.grid) - Self::weighted_total(&next);
        }

        self.grid = next;
        self.bounds_reached = bounds_reached;
        self.step += 1;

        trace!("{} step {}: changed {changed}", Self::NAME, self.step);

        Ok(changed)
    }
}

impl Region for SpreadIntegerValue {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn upper_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        self.side() as isize - 1
    }

    fn lower_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
        1 - self.side() as isize
    }
}

impl ValueAt for SpreadIntegerValue {
    fn value_at(&self, coordinates: &Coordinates) -> Value {
        let folded = coordinates.folded();
        if folded.get(0) < self.side() as isize {
            self.grid.get(&folded)
        } else {
            self.config.background_value
        }
    }
}

impl TotalValue for SpreadIntegerValue {
    /// Every stored value counts once for each position of its orbit.
    fn total_value(&self) -> Value {
        Self::weighted_total(&self.grid)
    }
}

impl SymmetryFoldable for SpreadIntegerValue {
    fn asymmetric_region(&self) -> Cone {
        self.grid.shape().cone()
    }

    fn value_in_asymmetric_region(&self, coordinates: &Coordinates) -> Value {
        self.grid.get(coordinates)
    }
}

impl Persistent for SpreadIntegerValue {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            kind: ModelKind::Reduced,
            config: self.config,
            step: self.step,
            side: self.side(),
            origin: 0,
            bounds_reached: self.bounds_reached,
            discarded: self.discarded,
            values: self.grid.values().to_vec(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        if snapshot.kind != ModelKind::Reduced {
            return Err(Error::InvalidSnapshot(format!(
                "Expected a {} snapshot, found a {} one",
                ModelKind::Reduced.name(),
                snapshot.kind.name()
            )));
        }
        snapshot.config.validate()?;

        if snapshot.origin != 0 {
            return Err(Error::InvalidSnapshot(format!(
                "The cone is rooted at the origin, found origin {}",
                snapshot.origin
            )));
        }

        let shape = Anisotropic::new(snapshot.config.dimension, snapshot.side)?;
        let grid = NdArray::from_values(shape, snapshot.values)?;

        Ok(Self {
            config: snapshot.config,
            step: snapshot.step,
            grid,
            bounds_reached: snapshot.bounds_reached,
            discarded: snapshot.discarded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BoundsRegion;
    use hashbrown::HashSet;

    #[test]
    fn orbit_sizes() {
        assert_eq!(orbit_size(&[0].into()), 1);
        assert_eq!(orbit_size(&[3].into()), 2);
        assert_eq!(orbit_size(&[0, 0, 0].into()), 1);
        assert_eq!(orbit_size(&[1, 0, 0].into()), 6);
        assert_eq!(orbit_size(&[2, 1, 0].into()), 24);
        assert_eq!(orbit_size(&[2, 2, 2].into()), 8);
        assert_eq!(orbit_size(&[4, 4, 1, 0].into()), 12 * 8);
    }

    #[test]
    fn orbits_cover_the_box() {
        for dimension in 1..=4 {
            for side in 1..=4 {
                let covered: Value = Cone::new(dimension, side)
                    .positions()
                    .map(|c| orbit_size(&c))
                    .sum();
                let width = 2 * side as Value - 1;
                assert_eq!(covered, width.pow(dimension as u32));
            }
        }
    }

    #[test]
    fn neighbourhood_covers_the_cone_and_its_neighbours() {
        for dimension in 1..=3 {
            let side = 4;
            let region = ConeNeighbourhood::new(dimension, side);
            let cone = Cone::new(dimension, side);

            let walked: Vec<_> = region.positions().collect();
            let expected: Vec<_> = BoundsRegion::centered(dimension, side as isize + 2)
                .into_positions()
                .filter(|p| {
                    p.get(0) < side as isize
                        && (cone.contains(p)
                            || (0..2 * dimension).any(|i| cone.contains(&neighbor_position(p, i))))
                })
                .collect();

            let walked_set: HashSet<&Coordinates> = walked.iter().collect();
            assert_eq!(walked_set.len(), walked.len());
            assert!(expected.iter().all(|p| walked_set.contains(p)), "{dimension}");
            assert!(walked.iter().all(|p| region.contains(p)));
            // One step outside the cone on every negative axis at most
            assert!(walked.iter().all(|p| p.as_slice().iter().all(|c| *c >= -1)));
        }
    }

    #[test]
    fn value_at_folds() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(2, 500, 0)).unwrap();
        for _ in 0..4 {
            model.next_step().unwrap();
        }

        for c in BoundsRegion::centered(2, 4).into_positions() {
            let swapped = Coordinates::from([-c.get(1), c.get(0)]);
            assert_eq!(model.value_at(&c), model.value_at(&swapped), "{c}");
        }
    }

    #[test]
    fn one_dimensional_spread() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(1, 9, 0)).unwrap();
        let line = |m: &SpreadIntegerValue| -> Vec<Value> {
            (-3..=3).map(|x| m.value_at(&[x].into())).collect()
        };

        assert!(model.next_step().unwrap());
        assert_eq!(line(&model), vec![0, 0, 3, 3, 3, 0, 0]);

        assert!(model.next_step().unwrap());
        assert_eq!(line(&model), vec![0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(model.side(), 3);

        assert!(model.next_step().unwrap());
        assert_eq!(model.side(), 4);
        assert_eq!(line(&model), vec![0, 1, 3, 1, 3, 1, 0]);
        assert_eq!(model.total_value(), 9);
    }

    #[test]
    fn conserves_value_while_growing() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(3, -7_000, 0)).unwrap();
        for _ in 0..30 {
            model.next_step().unwrap();
            assert_eq!(model.total_value(), -7_000);
        }
        assert!(model.side() > INITIAL_SIDE);
    }

    #[test]
    fn fixed_frontier_discards_exactly() {
        let config = SimulationConfig::new(2, 10_000, 0).with_frontier(FrontierPolicy::Fixed);
        let mut model = SpreadIntegerValue::new(config).unwrap();

        for _ in 0..40 {
            model.next_step().unwrap();
            assert_eq!(model.side(), INITIAL_SIDE);
            assert_eq!(model.total_value() + model.discarded_value(), 10_000);
        }
        assert!(model.discarded_value() > 0);
    }

    #[test]
    fn asymmetric_values_are_the_stored_ones() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(3, 2_000, 0)).unwrap();
        for _ in 0..6 {
            model.next_step().unwrap();
        }

        let region = model.asymmetric_region();
        assert_eq!(region.side(), model.side());
        for c in region.positions() {
            assert_eq!(model.value_in_asymmetric_region(&c), model.value_at(&c));
        }
    }

    #[test]
    fn snapshot_restores_the_same_state() {
        let mut model = SpreadIntegerValue::new(SimulationConfig::new(3, 900, 0)).unwrap();
        for _ in 0..7 {
            model.next_step().unwrap();
        }

        let mut restored = SpreadIntegerValue::from_snapshot(model.snapshot()).unwrap();
        model.next_step().unwrap();
        restored.next_step().unwrap();

        assert_eq!(restored.snapshot(), model.snapshot());
    }

    #[test]
    fn full_grid_snapshots_are_rejected() {
        let mut snapshot = SpreadIntegerValue::new(SimulationConfig::new(2, 5, 0))
            .unwrap()
            .snapshot();
        snapshot.kind = ModelKind::FullGrid;

        assert!(matches!(
            SpreadIntegerValue::from_snapshot(snapshot),
            Err(Error::InvalidSnapshot(_))
        ));
    }
}
