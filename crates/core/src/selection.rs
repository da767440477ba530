//! Selection and focus state for the editable grid.
//!
//! The model tracks which cell is selected, whether it is being edited, and
//! an optional rectangular region. It never clamps coordinates: callers are
//! expected to pass in-bounds cells (see `EditableGrid::clamp`).

use serde::{Deserialize, Serialize};

use crate::coords::CellCoordinates;

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: usize,
}

impl Range {
    /// Create a range spanning two corners, normalizing so start <= end.
    pub fn spanning(a: CellCoordinates, b: CellCoordinates) -> Self {
        Self {
            start_col: a.col_idx.min(b.col_idx),
            start_row: a.row_idx.min(b.row_idx),
            end_col: a.col_idx.max(b.col_idx),
            end_row: a.row_idx.max(b.row_idx),
        }
    }

    /// Create a single-cell range.
    pub fn single(cell: CellCoordinates) -> Self {
        Self::spanning(cell, cell)
    }

    /// Range covering a whole grid of the given size. Both counts must be > 0.
    pub fn full(col_count: usize, row_count: usize) -> Self {
        Self {
            start_col: 0,
            start_row: 0,
            end_col: col_count.saturating_sub(1),
            end_row: row_count.saturating_sub(1),
        }
    }

    pub fn contains(&self, cell: CellCoordinates) -> bool {
        cell.row_idx >= self.start_row
            && cell.row_idx <= self.end_row
            && cell.col_idx >= self.start_col
            && cell.col_idx <= self.end_col
    }

    pub fn top_left(&self) -> CellCoordinates {
        CellCoordinates::new(self.start_col, self.start_row)
    }

    pub fn cell_count(&self) -> usize {
        (self.end_row - self.start_row + 1) * (self.end_col - self.start_col + 1)
    }

    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = CellCoordinates> {
        let (start_col, end_col) = (self.start_col, self.end_col);
        (self.start_row..=self.end_row)
            .flat_map(move |r| (start_col..=end_col).map(move |c| CellCoordinates::new(c, r)))
    }
}

/// How a selection request treats the addressed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Exactly one cell.
    #[default]
    Single,
    /// Rectangle from the anchor to the addressed cell.
    Area,
    /// The whole grid.
    All,
}

/// Observable state of the selection machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Idle,
    Selected,
    Focused,
    AreaSelected,
}

/// Selection/focus state machine.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Anchor cell; also the cell that is focused when editing.
    anchor: Option<CellCoordinates>,
    /// Moving corner of an area selection (shift+arrow extends from here).
    extent: Option<CellCoordinates>,
    area: Option<Range>,
    mode: SelectionMode,
    focused: bool,
    in_drag: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CellState {
        match self.anchor {
            None => CellState::Idle,
            Some(_) if self.focused => CellState::Focused,
            Some(_) if self.area.is_some() => CellState::AreaSelected,
            Some(_) => CellState::Selected,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// The selected (anchor) cell, if any.
    pub fn selected(&self) -> Option<CellCoordinates> {
        self.anchor
    }

    /// The moving corner of the selection; equals the anchor for single cells.
    pub fn extent(&self) -> Option<CellCoordinates> {
        self.extent.or(self.anchor)
    }

    /// The focused cell, when editing.
    pub fn focused(&self) -> Option<CellCoordinates> {
        if self.focused {
            self.anchor
        } else {
            None
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn in_drag(&self) -> bool {
        self.in_drag
    }

    /// The selected region: the area if any, else the single selected cell.
    pub fn region(&self) -> Option<Range> {
        self.area.or_else(|| self.anchor.map(Range::single))
    }

    pub fn contains(&self, cell: CellCoordinates) -> bool {
        self.region().is_some_and(|r| r.contains(cell))
    }

    /// Select a single cell (plain click). Leaves edit mode.
    pub fn select_cell(&mut self, cell: CellCoordinates) {
        self.anchor = Some(cell);
        self.extent = None;
        self.area = None;
        self.mode = SelectionMode::Single;
        self.focused = false;
    }

    /// Extend from the anchor to `cell` (shift+click, shift+arrow, drag).
    ///
    /// With nothing selected this behaves like `select_cell`. Extending back
    /// onto the anchor collapses to a single selection.
    pub fn extend_to(&mut self, cell: CellCoordinates) {
        let Some(anchor) = self.anchor else {
            self.select_cell(cell);
            return;
        };
        self.focused = false;
        if cell == anchor {
            self.extent = None;
            self.area = None;
            self.mode = SelectionMode::Single;
            return;
        }
        self.extent = Some(cell);
        self.area = Some(Range::spanning(anchor, cell));
        self.mode = SelectionMode::Area;
    }

    /// Select every cell of `full`; the anchor moves to its top-left corner.
    pub fn select_all(&mut self, full: Range) {
        let top_left = full.top_left();
        self.anchor = Some(top_left);
        self.extent = Some(CellCoordinates::new(full.end_col, full.end_row));
        self.area = Some(full);
        self.mode = SelectionMode::All;
        self.focused = false;
    }

    /// Enter edit mode on `cell`. Any area selection collapses.
    pub fn focus(&mut self, cell: CellCoordinates) {
        self.select_cell(cell);
        self.focused = true;
    }

    /// Leave edit mode, keeping the cell selected.
    pub fn unfocus(&mut self) {
        self.focused = false;
    }

    /// Start a drag gesture at `cell`.
    pub fn begin_drag(&mut self, cell: CellCoordinates) {
        self.select_cell(cell);
        self.in_drag = true;
    }

    /// Mouse entered `cell`. Extends the selection only while dragging.
    pub fn drag_over(&mut self, cell: CellCoordinates) -> bool {
        if !self.in_drag {
            return false;
        }
        self.extend_to(cell);
        true
    }

    pub fn end_drag(&mut self) {
        self.in_drag = false;
    }

    /// Back to idle.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
