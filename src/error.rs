//! Error types for sivsim.

use thiserror::Error;

/// Errors produced while constructing shapes and automata, or while
/// reading and writing snapshots.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested dimension is not supported by the shape or automaton.
    #[error("invalid dimension {got}: must be at least {min}")]
    InvalidDimension {
        /// Dimension that was requested.
        got: usize,
        /// Smallest supported dimension.
        min: usize,
    },

    /// Two models or regions that must share a dimension do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An extent of zero would produce an array without any cells.
    #[error("extent on axis {axis} is zero, degenerate shapes are not supported")]
    DegenerateShape {
        /// Axis with the zero extent.
        axis: usize,
    },

    /// The number of cells does not fit in `usize`.
    #[error("array volume overflows usize")]
    VolumeOverflow,

    /// A buffer of values does not have the length of the shape it is
    /// meant to fill.
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Edge enumeration was asked for a shell thinner than one cell.
    #[error("edge width must be greater than or equal to one")]
    InvalidEdgeWidth,

    /// A 2D cross-section was requested on invalid axes.
    #[error("invalid cross-section axes ({horizontal}, {vertical}) for dimension {dimension}")]
    InvalidCrossSection {
        horizontal: usize,
        vertical: usize,
        dimension: usize,
    },

    /// A snapshot was malformed or does not match the model it is loaded into.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
