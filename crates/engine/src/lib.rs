pub mod actions;
pub mod debounce;
pub mod error;
pub mod events;
pub mod grid;
pub mod keys;
pub mod lookup;
pub mod renderer;

pub use actions::{CellActions, GridController, GridTiming};
pub use error::GridError;
pub use events::GridEvent;
pub use grid::{CellMessage, EditableGrid, RowId};
pub use keys::{Key, Modifiers};
pub use lookup::{LookupCache, LookupKey, RequestToken};
pub use renderer::CellRenderer;
