//! `labgrid-core`: plain data for the editable grid.
//!
//! Value descriptors, cell coordinates, the selection state machine and the
//! clipboard paste parser. No storage, no I/O, no remote API types.

pub mod coords;
pub mod paste;
pub mod selection;
pub mod value;

pub use coords::CellCoordinates;
pub use paste::{parse_paste, paste_extent};
pub use selection::{CellState, Range, Selection, SelectionMode};
pub use value::{CellValues, ModificationType, ValueDescriptor};
