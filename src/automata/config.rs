use std::fmt;

use log::warn;

use crate::{Error, Result, Value};

use super::rule::share_count;

/// What happens when toppling reaches the edge of the stored grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FrontierPolicy {
    /// Grow the grid before the next step so that no value is lost.
    #[default]
    Grow,
    /// Keep the grid at its initial size. Value flowing past the edge is
    /// discarded.
    Fixed,
}

impl fmt::Display for FrontierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontierPolicy::Grow => write!(f, "grow"),
            FrontierPolicy::Fixed => write!(f, "fixed"),
        }
    }
}

/// The parameters of a simulation: everything needed to construct its
/// initial state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SimulationConfig {
    pub dimension: usize,
    /// The value placed at the origin.
    pub initial_value: Value,
    /// The value of every other position, including the ones not stored.
    pub background_value: Value,
    pub frontier: FrontierPolicy,
}

impl SimulationConfig {
    pub fn new(dimension: usize, initial_value: Value, background_value: Value) -> Self {
        Self {
            dimension,
            initial_value,
            background_value,
            frontier: FrontierPolicy::Grow,
        }
    }

    pub fn with_frontier(mut self, frontier: FrontierPolicy) -> Self {
        self.frontier = frontier;
        self
    }

    /// Check that a model can be built from this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dimension < 1 {
            return Err(Error::InvalidDimension {
                got: self.dimension,
                min: 1,
            });
        }

        if self.background_value != 0 {
            warn!(
                "Background value {} is not zero. The background does not topple, so results may not match an infinite lattice.",
                self.background_value
            );
        }

        Ok(())
    }

    /// The amount of parts a toppling cell splits its value into.
    pub fn share_count(&self) -> Value {
        share_count(self.dimension)
    }

    /// A relative path identifying a run of `name` with this configuration,
    /// used to group output files.
    pub fn sub_folder_path(&self, name: &str) -> String {
        let mut path = format!(
            "{}/{}D/{}/{}",
            name, self.dimension, self.initial_value, self.background_value
        );
        if self.frontier == FrontierPolicy::Fixed {
            path.push_str("/fixed");
        }
        path
    }
}
