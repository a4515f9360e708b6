//! Simulation of the spread integer value automaton on Z^n, in full and
//! symmetry reduced form.


pub mod arrays;
pub mod automata;
pub mod compare;
pub mod coords;
pub mod cross_section;
mod error;
pub mod region;
pub mod snapshot;

pub use error::{Error, Result};

/// The value held by a cell of the lattice.
pub type Value = i64;
