//! Editable grid storage.
//!
//! Rows are an ordered list of identifiers; cell values live in a sparse map
//! keyed by coordinate, so editing one cell never rewrites whole rows.
//! [`EditableGrid::modify`] is the only way cell values change.
//!
//! ## Bounds
//!
//! Storage does not reject out-of-range coordinates. Owners check with
//! [`EditableGrid::in_bounds`] / [`EditableGrid::check_bounds`] or map with
//! [`EditableGrid::clamp`] before writing.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use labgrid_core::{CellCoordinates, CellValues, ModificationType, Range, ValueDescriptor};
use labgrid_query_client::QueryColumn;

use crate::error::GridError;
use crate::renderer::CellRenderer;

/// Identity of a grid row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowId {
    /// Row loaded from the server; holds its key value (or an object of key fields).
    Existing(Value),
    /// Row added in the grid, not yet inserted.
    New,
}

impl RowId {
    pub fn is_new(&self) -> bool {
        matches!(self, RowId::New)
    }
}

/// Presentational message attached to a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMessage {
    pub message: String,
}

impl CellMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditableGrid {
    columns: Vec<QueryColumn>,
    renderers: Vec<CellRenderer>,
    row_ids: Vec<RowId>,
    cells: FxHashMap<CellCoordinates, CellValues>,
    messages: FxHashMap<CellCoordinates, CellMessage>,
}

impl EditableGrid {
    pub fn new(columns: Vec<QueryColumn>, row_ids: Vec<RowId>) -> Self {
        let renderers = columns.iter().map(CellRenderer::for_column).collect();
        Self {
            columns,
            renderers,
            row_ids,
            cells: FxHashMap::default(),
            messages: FxHashMap::default(),
        }
    }

    /// Grid with `row_count` new, empty rows.
    pub fn with_new_rows(columns: Vec<QueryColumn>, row_count: usize) -> Self {
        Self::new(columns, vec![RowId::New; row_count])
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn columns(&self) -> &[QueryColumn] {
        &self.columns
    }

    pub fn column(&self, col_idx: usize) -> Option<&QueryColumn> {
        self.columns.get(col_idx)
    }

    pub fn column_index(&self, field_key: &str) -> Result<usize, GridError> {
        self.columns
            .iter()
            .position(|c| c.field_key.eq_ignore_ascii_case(field_key))
            .ok_or_else(|| GridError::UnknownColumn(field_key.to_string()))
    }

    pub fn renderer(&self, col_idx: usize) -> Option<&CellRenderer> {
        self.renderers.get(col_idx)
    }

    pub fn is_read_only(&self, col_idx: usize) -> bool {
        self.columns.get(col_idx).is_some_and(|c| c.read_only)
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn row_id(&self, row_idx: usize) -> Option<&RowId> {
        self.row_ids.get(row_idx)
    }

    // ── Bounds ──────────────────────────────────────────────────────

    pub fn in_bounds(&self, cell: CellCoordinates) -> bool {
        cell.col_idx < self.column_count() && cell.row_idx < self.row_count()
    }

    pub fn check_bounds(&self, cell: CellCoordinates) -> Result<(), GridError> {
        if self.in_bounds(cell) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                cell,
                cols: self.column_count(),
                rows: self.row_count(),
            })
        }
    }

    /// Pull a coordinate onto the last column/row. Grid must be non-empty.
    pub fn clamp(&self, cell: CellCoordinates) -> CellCoordinates {
        CellCoordinates::new(
            cell.col_idx.min(self.column_count().saturating_sub(1)),
            cell.row_idx.min(self.row_count().saturating_sub(1)),
        )
    }

    /// Clamp a range into the grid. Grid must be non-empty.
    pub fn clamp_range(&self, range: Range) -> Range {
        Range::spanning(
            self.clamp(range.top_left()),
            self.clamp(CellCoordinates::new(range.end_col, range.end_row)),
        )
    }

    pub fn full_range(&self) -> Option<Range> {
        if self.column_count() == 0 || self.row_count() == 0 {
            None
        } else {
            Some(Range::full(self.column_count(), self.row_count()))
        }
    }

    // ── Values ──────────────────────────────────────────────────────

    /// Values of a cell; empty for cells never written.
    pub fn values(&self, cell: CellCoordinates) -> &[ValueDescriptor] {
        self.cells.get(&cell).map(CellValues::as_slice).unwrap_or(&[])
    }

    pub fn cell_values(&self, cell: CellCoordinates) -> CellValues {
        self.cells.get(&cell).cloned().unwrap_or_default()
    }

    pub fn display_text(&self, cell: CellCoordinates) -> String {
        self.cells
            .get(&cell)
            .map(CellValues::display_text)
            .unwrap_or_default()
    }

    /// Apply a modification to one cell. Emptied cells are dropped from storage.
    pub fn modify(
        &mut self,
        cell: CellCoordinates,
        new_values: &[ValueDescriptor],
        kind: ModificationType,
    ) {
        let values = self.cells.entry(cell).or_default();
        values.apply(new_values, kind);
        if values.is_empty() {
            self.cells.remove(&cell);
        }
    }

    /// Non-empty cells of one row, by column index.
    pub fn row_cells(&self, row_idx: usize) -> impl Iterator<Item = (usize, &CellValues)> {
        (0..self.column_count()).filter_map(move |col| {
            self.cells
                .get(&CellCoordinates::new(col, row_idx))
                .map(|v| (col, v))
        })
    }

    // ── Rows ────────────────────────────────────────────────────────

    /// Append `count` new rows. Returns the index of the first one.
    pub fn add_rows(&mut self, count: usize) -> usize {
        let start = self.row_ids.len();
        self.row_ids.extend(std::iter::repeat(RowId::New).take(count));
        start
    }

    /// Remove rows by index, shifting later rows up. Unknown indices are ignored.
    pub fn remove_rows(&mut self, row_indices: &[usize]) -> Vec<usize> {
        let mut removed: Vec<usize> = row_indices
            .iter()
            .copied()
            .filter(|&r| r < self.row_count())
            .collect();
        removed.sort_unstable();
        removed.dedup();
        if removed.is_empty() {
            return removed;
        }

        // New index for each surviving old row
        let shift = |row: usize| -> Option<usize> {
            match removed.binary_search(&row) {
                Ok(_) => None,
                Err(below) => Some(row - below),
            }
        };

        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .filter_map(|(c, v)| shift(c.row_idx).map(|r| (CellCoordinates::new(c.col_idx, r), v)))
            .collect();
        self.messages = std::mem::take(&mut self.messages)
            .into_iter()
            .filter_map(|(c, m)| shift(c.row_idx).map(|r| (CellCoordinates::new(c.col_idx, r), m)))
            .collect();

        let mut idx = 0;
        self.row_ids.retain(|_| {
            let keep = removed.binary_search(&idx).is_err();
            idx += 1;
            keep
        });

        removed
    }

    // ── Messages ────────────────────────────────────────────────────

    pub fn set_message(&mut self, cell: CellCoordinates, message: CellMessage) {
        self.messages.insert(cell, message);
    }

    pub fn clear_message(&mut self, cell: CellCoordinates) {
        self.messages.remove(&cell);
    }

    pub fn message(&self, cell: CellCoordinates) -> Option<&CellMessage> {
        self.messages.get(&cell)
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Drop all values, messages and rows, keeping the columns.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.messages.clear();
        self.row_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cell(col: usize, row: usize) -> CellCoordinates {
        CellCoordinates::new(col, row)
    }

    fn grid() -> EditableGrid {
        EditableGrid::new(
            vec![QueryColumn::new("Name"), QueryColumn::new("Volume").read_only()],
            vec![RowId::Existing(json!(10)), RowId::Existing(json!(11)), RowId::New],
        )
    }

    #[test]
    fn test_bounds_helpers() {
        let g = grid();
        assert!(g.in_bounds(cell(1, 2)));
        assert!(!g.in_bounds(cell(2, 0)));
        assert_eq!(
            g.check_bounds(cell(0, 3)),
            Err(GridError::OutOfBounds { cell: cell(0, 3), cols: 2, rows: 3 })
        );
        assert_eq!(g.clamp(cell(9, 9)), cell(1, 2));
        assert_eq!(g.full_range(), Some(Range::full(2, 3)));
        assert_eq!(EditableGrid::default().full_range(), None);
    }

    #[test]
    fn test_modify_and_drop_empty() {
        let mut g = grid();
        g.modify(cell(0, 0), &[ValueDescriptor::text("S-1")], ModificationType::Replace);
        assert_eq!(g.display_text(cell(0, 0)), "S-1");
        g.modify(cell(0, 0), &[], ModificationType::RemoveAll);
        assert!(g.values(cell(0, 0)).is_empty());
        assert_eq!(g.row_cells(0).count(), 0);
    }

    #[test]
    fn test_column_lookup() {
        let g = grid();
        assert_eq!(g.column_index("volume"), Ok(1));
        assert!(matches!(g.column_index("Nope"), Err(GridError::UnknownColumn(_))));
        assert!(g.is_read_only(1));
        assert!(!g.is_read_only(0));
        assert_eq!(g.renderer(0), Some(&CellRenderer::PlainText));
    }

    #[test]
    fn test_remove_rows_shifts_cells() {
        let mut g = grid();
        g.modify(cell(0, 0), &[ValueDescriptor::text("a")], ModificationType::Replace);
        g.modify(cell(0, 1), &[ValueDescriptor::text("b")], ModificationType::Replace);
        g.modify(cell(0, 2), &[ValueDescriptor::text("c")], ModificationType::Replace);
        g.set_message(cell(0, 2), CellMessage::new("check"));

        let removed = g.remove_rows(&[1, 1, 7]);
        assert_eq!(removed, vec![1]);
        assert_eq!(g.row_count(), 2);
        assert_eq!(g.display_text(cell(0, 0)), "a");
        assert_eq!(g.display_text(cell(0, 1)), "c");
        assert_eq!(g.message(cell(0, 1)), Some(&CellMessage::new("check")));
        assert_eq!(g.row_ids(), &[RowId::Existing(json!(10)), RowId::New]);
    }

    #[test]
    fn test_add_rows() {
        let mut g = grid();
        assert_eq!(g.add_rows(2), 3);
        assert_eq!(g.row_count(), 5);
        assert!(g.row_id(4).unwrap().is_new());
    }
}
