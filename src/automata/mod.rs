//! The spread integer value automaton.
//!
//! Starting from a single value at the origin of Z^n, every step lets each
//! cell that holds enough value share it with its axis neighbours (see
//! [`rule`]). Two realizations are provided: [`SimpleSpreadIntegerValue`]
//! stores the whole grid, [`SpreadIntegerValue`] stores one representative
//! per symmetry orbit. Both grow their grid as the value spreads and must
//! agree at every position after every step.

use crate::{
    coords::Coordinates,
    region::{Cone, Region},
    Result, Value,
};

mod config;
pub use config::{FrontierPolicy, SimulationConfig};

pub mod rule;

mod full_grid;
pub use full_grid::SimpleSpreadIntegerValue;

mod symmetric;
pub use symmetric::{orbit_size, ConeNeighbourhood, SpreadIntegerValue};

/// A stepped simulation.
pub trait CellularAutomaton {
    /// A name for the model, used in logs and output paths.
    fn name(&self) -> &'static str;

    fn config(&self) -> &SimulationConfig;

    /// The amount of steps taken so far.
    fn step(&self) -> u64;

    /// Compute the next step. Returns `true` if any cell toppled, i.e. the
    /// state may have changed.
    fn next_step(&mut self) -> Result<bool>;

    /// A relative path grouping the output of runs with the same model and
    /// configuration.
    fn sub_folder_path(&self) -> String {
        self.config().sub_folder_path(self.name())
    }
}

/// Pointwise access to the current state.
pub trait ValueAt {
    /// The value at `coordinates`. Positions outside of the stored grid hold
    /// the background value.
    fn value_at(&self, coordinates: &Coordinates) -> Value;
}

/// The sum of every value in a region.
pub trait TotalValue: Region + ValueAt {
    fn total_value(&self) -> Value
    where
        Self: Sized,
    {
        self.positions().map(|c| self.value_at(&c)).sum()
    }
}

/// A state that is invariant under axis permutations and sign flips, so
/// that it is fully described by its values on the cone
/// `c0 >= c1 >= ... >= cn >= 0`.
pub trait SymmetryFoldable: ValueAt {
    /// The part of the cone covered by the stored grid.
    fn asymmetric_region(&self) -> Cone;

    /// The value at `coordinates`, which must lie in
    /// [`asymmetric_region`](SymmetryFoldable::asymmetric_region).
    fn value_in_asymmetric_region(&self, coordinates: &Coordinates) -> Value {
        self.value_at(coordinates)
    }
}
