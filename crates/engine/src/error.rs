use std::fmt;

use labgrid_core::CellCoordinates;

/// Precondition failures reported by the grid owner's checking helpers.
///
/// Cell actions themselves never fail; callers use these to validate
/// coordinates before invoking them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside `[0, cols) x [0, rows)`.
    OutOfBounds {
        cell: CellCoordinates,
        cols: usize,
        rows: usize,
    },
    /// No column with this field key.
    UnknownColumn(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { cell, cols, rows } => {
                write!(f, "cell {cell} is outside the {cols}x{rows} grid")
            }
            Self::UnknownColumn(key) => write!(f, "unknown column: {key}"),
        }
    }
}

impl std::error::Error for GridError {}
