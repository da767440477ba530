//! Cell actions and the grid controller.
//!
//! [`CellActions`] is the operation contract every cell renderer calls into.
//! [`GridController`] implements it on top of an [`EditableGrid`], a
//! [`Selection`] and a shared [`LookupCache`], and also owns the pieces that
//! turn raw mouse/keyboard input into those actions: the in-cell editor with
//! its commit debounce, and the key recorder for scanner input.
//!
//! ## Preconditions
//!
//! Actions take coordinates as given and never fail. Keyboard navigation in
//! this controller clamps arrows to the grid and wraps Tab onto the next row;
//! anything else calling an action directly must pass in-bounds coordinates
//! (see [`EditableGrid::check_bounds`]).

use std::time::{Duration, Instant};

use serde_json::Value;

use labgrid_config::Settings;
use labgrid_core::{
    paste_extent, parse_paste, CellCoordinates, CellState, ModificationType, Selection,
    SelectionMode, ValueDescriptor,
};
use labgrid_query_client::LookupInfo;

use crate::debounce::Debouncer;
use crate::events::{EventCollector, GridEvent};
use crate::grid::{CellMessage, EditableGrid};
use crate::keys::{Key, KeyRecorder, Modifiers, RecordedInput};
use crate::lookup::{LookupCache, LookupKey, SearchDebounce};
use crate::renderer::CellRenderer;

/// Operations exposed to cell renderers.
pub trait CellActions {
    /// Enter edit mode. With `clear_existing_value` the editor starts empty.
    fn focus_cell(&mut self, col_idx: usize, row_idx: usize, clear_existing_value: bool);

    /// Select a cell, extend to it (`Area`), or select everything (`All`).
    /// With `reset_value` a pending edit is discarded instead of committed.
    fn select_cell(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        selection_mode: Option<SelectionMode>,
        reset_value: bool,
    );

    /// The single write path for cell values.
    fn modify_cell(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        new_values: &[ValueDescriptor],
        modification_type: ModificationType,
    );

    fn clear_selection(&mut self);

    /// Copy each selected column's top value down through the selection.
    fn fill_down(&mut self);

    /// Paste tab/newline separated text starting at the given cell, adding rows as needed.
    fn fill_text(&mut self, col_idx: usize, row_idx: usize, text: &str);

    fn in_drag(&self) -> bool;
}

/// Debounce intervals and lookup paging used by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridTiming {
    pub commit: Duration,
    pub key_recording: Duration,
    pub lookup_search: Duration,
    /// Rows requested by a lookup's initial load and by each search.
    pub lookup_page_size: usize,
}

impl Default for GridTiming {
    fn default() -> Self {
        Self {
            commit: Duration::from_millis(250),
            key_recording: Duration::from_millis(25),
            lookup_search: Duration::from_millis(350),
            lookup_page_size: 100,
        }
    }
}

impl GridTiming {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            commit: settings.commit_debounce(),
            key_recording: settings.key_recording_window(),
            lookup_search: settings.lookup_search_debounce(),
            lookup_page_size: settings.lookup_page_size,
        }
    }
}

/// In-progress edit of the focused cell.
#[derive(Debug, Clone)]
struct EditSession {
    cell: CellCoordinates,
    buffer: String,
    dirty: bool,
    commit: Debouncer,
}

pub struct GridController {
    grid: EditableGrid,
    selection: Selection,
    lookups: LookupCache,
    timing: GridTiming,
    editor: Option<EditSession>,
    search: SearchDebounce,
    pending_loads: Vec<LookupInfo>,
    recorder: KeyRecorder,
    events: EventCollector,
}

impl GridController {
    pub fn new(grid: EditableGrid, lookups: LookupCache, timing: GridTiming) -> Self {
        Self {
            grid,
            selection: Selection::new(),
            lookups,
            timing,
            editor: None,
            search: SearchDebounce::new(timing.lookup_search),
            pending_loads: Vec::new(),
            recorder: KeyRecorder::new(timing.key_recording),
            events: EventCollector::new(),
        }
    }

    pub fn grid(&self) -> &EditableGrid {
        &self.grid
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn state(&self) -> CellState {
        self.selection.state()
    }

    pub fn lookups(&self) -> &LookupCache {
        &self.lookups
    }

    pub fn timing(&self) -> GridTiming {
        self.timing
    }

    /// Current editor text, when a cell is focused.
    pub fn editor_text(&self) -> Option<&str> {
        self.editor.as_ref().map(|e| e.buffer.as_str())
    }

    pub fn events(&self) -> &[GridEvent] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    /// Error placeholder for a lookup cell whose options failed to load.
    pub fn cell_placeholder(&self, cell: CellCoordinates) -> Option<String> {
        match self.grid.renderer(cell.col_idx)? {
            CellRenderer::Lookup(key) => self.lookups.placeholder(key),
            _ => None,
        }
    }

    pub fn set_cell_message(&mut self, cell: CellCoordinates, message: CellMessage) {
        self.grid.set_message(cell, message);
    }

    /// Replace the grid (e.g. switching data-entry tabs). Selection and edits are dropped.
    pub fn reset(&mut self, grid: EditableGrid) {
        self.editor = None;
        self.recorder.cancel();
        self.selection.clear();
        self.grid = grid;
        self.events.push(GridEvent::SelectionChanged(CellState::Idle));
    }

    // ── Rows ────────────────────────────────────────────────────────

    pub fn add_rows(&mut self, count: usize) -> usize {
        let start = self.grid.add_rows(count);
        if count > 0 {
            self.events.push(GridEvent::RowsAdded { start, count });
        }
        start
    }

    /// Remove every row touched by the selection.
    pub fn remove_selected_rows(&mut self) {
        let Some(region) = self.selection.region() else {
            return;
        };
        self.editor = None;
        let rows: Vec<usize> = (region.start_row..=region.end_row).collect();
        let removed = self.grid.remove_rows(&rows);
        self.selection.clear();
        if !removed.is_empty() {
            self.events.push(GridEvent::RowsRemoved(removed));
        }
        self.events.push(GridEvent::SelectionChanged(CellState::Idle));
    }

    // ── Navigation policy ───────────────────────────────────────────

    /// Move by a delta, clamped to the grid.
    pub fn move_target(
        &self,
        from: CellCoordinates,
        d_col: isize,
        d_row: isize,
    ) -> CellCoordinates {
        let max_col = self.grid.column_count().saturating_sub(1) as isize;
        let max_row = self.grid.row_count().saturating_sub(1) as isize;
        CellCoordinates::new(
            (from.col_idx as isize + d_col).clamp(0, max_col) as usize,
            (from.row_idx as isize + d_row).clamp(0, max_row) as usize,
        )
    }

    /// Next (or previous) column, wrapping across rows. Stays put at the grid's ends.
    pub fn tab_target(&self, from: CellCoordinates, backwards: bool) -> CellCoordinates {
        let last_col = self.grid.column_count().saturating_sub(1);
        let last_row = self.grid.row_count().saturating_sub(1);
        if backwards {
            match (from.col_idx, from.row_idx) {
                (0, 0) => from,
                (0, row) => CellCoordinates::new(last_col, row - 1),
                (col, row) => CellCoordinates::new(col - 1, row),
            }
        } else if from.col_idx < last_col {
            CellCoordinates::new(from.col_idx + 1, from.row_idx)
        } else if from.row_idx < last_row {
            CellCoordinates::new(0, from.row_idx + 1)
        } else {
            from
        }
    }

    // ── Mouse ───────────────────────────────────────────────────────

    pub fn mouse_down(&mut self, cell: CellCoordinates, modifiers: Modifiers) {
        if modifiers.shift && self.selection.selected().is_some() {
            self.select_cell(cell.col_idx, cell.row_idx, Some(SelectionMode::Area), false);
            return;
        }
        self.finish_edit(true);
        self.recorder.cancel();
        self.selection.begin_drag(cell);
        self.events.push(GridEvent::SelectionChanged(self.selection.state()));
    }

    pub fn mouse_enter(&mut self, cell: CellCoordinates) {
        if self.selection.drag_over(cell) {
            self.events.push(GridEvent::SelectionChanged(self.selection.state()));
        }
    }

    pub fn mouse_up(&mut self) {
        self.selection.end_drag();
    }

    pub fn double_click(&mut self, cell: CellCoordinates) {
        self.focus_cell(cell.col_idx, cell.row_idx, false);
    }

    /// Focus left the grid entirely.
    pub fn blur(&mut self) {
        self.clear_selection();
    }

    // ── Keyboard ────────────────────────────────────────────────────

    pub fn key_down(&mut self, key: Key, modifiers: Modifiers, now: Instant) {
        if self.grid.full_range().is_none() {
            return;
        }
        let Some(current) = self.selection.selected() else {
            return;
        };

        if self.selection.is_focused() {
            self.key_down_focused(key, modifiers, current);
            return;
        }

        if self.recorder.is_recording() {
            match key {
                Key::Char(ch) if !modifiers.control && !modifiers.alt => {
                    self.recorder.record(ch, now);
                    return;
                }
                Key::Enter => {
                    self.recorder.record('\n', now);
                    return;
                }
                _ => self.recorder.cancel(),
            }
        }

        match key {
            Key::Char(ch) if modifiers.control => {
                if ch.eq_ignore_ascii_case(&'a') {
                    self.select_cell(
                        current.col_idx,
                        current.row_idx,
                        Some(SelectionMode::All),
                        false,
                    );
                }
            }
            Key::Char(ch) if !modifiers.alt => self.start_typing(current, ch, now),
            Key::Char(_) => {}
            Key::Enter => self.focus_cell(current.col_idx, current.row_idx, false),
            Key::Tab => {
                let target = self.tab_target(current, modifiers.shift);
                self.select_cell(target.col_idx, target.row_idx, None, false);
            }
            Key::Escape => {
                if self.state() == CellState::AreaSelected {
                    self.select_cell(current.col_idx, current.row_idx, None, false);
                }
            }
            Key::Delete | Key::Backspace => self.clear_selected_values(),
            Key::Up | Key::Down | Key::Left | Key::Right => {
                let Some((d_col, d_row)) = key.arrow_delta() else {
                    return;
                };
                if modifiers.shift {
                    let from = self.selection.extent().unwrap_or(current);
                    let target = self.move_target(from, d_col, d_row);
                    self.select_cell(
                        target.col_idx,
                        target.row_idx,
                        Some(SelectionMode::Area),
                        false,
                    );
                } else {
                    let target = self.move_target(current, d_col, d_row);
                    self.select_cell(target.col_idx, target.row_idx, None, false);
                }
            }
        }
    }

    fn key_down_focused(&mut self, key: Key, modifiers: Modifiers, cell: CellCoordinates) {
        match key {
            Key::Escape => {
                let discard = self
                    .grid
                    .renderer(cell.col_idx)
                    .is_some_and(CellRenderer::discards_on_escape);
                self.finish_edit(!discard);
                self.selection.unfocus();
                self.events.push(GridEvent::SelectionChanged(self.selection.state()));
            }
            Key::Enter => {
                self.finish_edit(true);
                let target = self.move_target(cell, 0, 1);
                self.select_cell(target.col_idx, target.row_idx, None, false);
            }
            Key::Tab => {
                self.finish_edit(true);
                let target = self.tab_target(cell, modifiers.shift);
                self.select_cell(target.col_idx, target.row_idx, None, false);
            }
            // Text keys belong to the editor, which reports through `type_text`
            _ => {}
        }
    }

    /// A printable key on a selected, not yet focused cell.
    fn start_typing(&mut self, cell: CellCoordinates, ch: char, now: Instant) {
        if self.grid.is_read_only(cell.col_idx) {
            return;
        }
        if self.grid.renderer(cell.col_idx).is_some_and(CellRenderer::is_lookup) {
            self.recorder.record(ch, now);
            return;
        }
        self.focus_cell(cell.col_idx, cell.row_idx, true);
        self.type_text(&ch.to_string(), now);
    }

    /// The focused editor's full text changed.
    ///
    /// Lookup editors treat the text as a search; their value only changes
    /// through [`GridController::choose_option`].
    pub fn type_text(&mut self, text: &str, now: Instant) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        editor.buffer = text.to_string();
        if self.grid.renderer(editor.cell.col_idx).is_some_and(CellRenderer::is_lookup) {
            self.search.input(text, now);
        } else {
            editor.dirty = true;
            editor.commit.restart(now);
        }
    }

    /// Search text for the focused lookup editor, once typing has paused.
    pub fn poll_lookup_search(&mut self, now: Instant) -> Option<(LookupInfo, String)> {
        let text = self.search.poll(now)?;
        let cell = self.selection.focused()?;
        let lookup = self.grid.column(cell.col_idx)?.lookup.clone()?;
        Some((lookup, text))
    }

    /// Next lookup whose options need an initial load, with the page size to
    /// fetch. The owner runs [`LookupCache::ensure_loaded`] with it and then
    /// calls [`GridController::refresh_lookup_displays`].
    pub fn poll_lookup_load(&mut self) -> Option<(LookupInfo, usize)> {
        if self.pending_loads.is_empty() {
            return None;
        }
        let lookup = self.pending_loads.remove(0);
        Some((lookup, self.timing.lookup_page_size))
    }

    /// Queue the initial load for a lookup column, once per unloaded key.
    fn request_lookup_load(&mut self, col_idx: usize) {
        let Some(lookup) = self.grid.column(col_idx).and_then(|c| c.lookup.clone()) else {
            return;
        };
        let key = LookupKey::for_lookup(&lookup);
        if self.lookups.is_loaded(&key) || self.lookups.is_in_flight(&key) {
            return;
        }
        if self.pending_loads.iter().any(|l| LookupKey::for_lookup(l) == key) {
            return;
        }
        self.lookups.touch(&key);
        self.pending_loads.push(lookup);
        self.events.push(GridEvent::LookupLoadRequested(key));
    }

    /// Swap raw-key displays for loaded option text in every column using `key`.
    ///
    /// Cells whose display is still their raw value get the cached display;
    /// anything the cache does not know stays as it is. Returns the number of
    /// cells updated.
    pub fn refresh_lookup_displays(&mut self, key: &LookupKey) -> usize {
        let columns: Vec<usize> = (0..self.grid.column_count())
            .filter(|&col| {
                matches!(self.grid.renderer(col), Some(CellRenderer::Lookup(k)) if k == key)
            })
            .collect();

        let mut changed = Vec::new();
        for col in columns {
            for row in 0..self.grid.row_count() {
                let cell = CellCoordinates::new(col, row);
                let current = self.grid.values(cell);
                let mut resolved_any = false;
                let resolved: Vec<ValueDescriptor> = current
                    .iter()
                    .map(|d| {
                        if d.display != d.raw && !d.display.is_null() {
                            return d.clone();
                        }
                        match self.lookups.find_by_raw(key, &d.raw) {
                            Some(known) if known.display != d.display => {
                                resolved_any = true;
                                ValueDescriptor::new(d.raw.clone(), known.display)
                            }
                            _ => d.clone(),
                        }
                    })
                    .collect();
                if resolved_any {
                    self.grid.modify(cell, &resolved, ModificationType::Replace);
                    changed.push(cell);
                }
            }
        }

        let count = changed.len();
        if count > 0 {
            log::debug!("Resolved {} lookup display(s) for {}", count, key.as_str());
            self.events.push(GridEvent::CellsChanged(changed));
        }
        count
    }

    /// Run due debounced work: value commit and key recording.
    pub fn tick(&mut self, now: Instant) {
        let mut due_commit = None;
        if let Some(editor) = self.editor.as_mut() {
            if editor.commit.fire_if_due(now) {
                editor.dirty = false;
                due_commit = Some((editor.cell, editor.buffer.clone()));
            }
        }
        if let Some((cell, text)) = due_commit {
            self.write_text(cell, &text);
        }

        let Some(input) = self.recorder.poll(now) else {
            return;
        };
        let Some(cell) = self.selection.selected() else {
            return;
        };
        match input {
            RecordedInput::Submit(text) => {
                let scanned = text.split('\n').next().unwrap_or_default().trim_end_matches('\r');
                self.fill_text(cell.col_idx, cell.row_idx, scanned);
                let next = self.move_target(cell, 0, 1);
                self.select_cell(next.col_idx, next.row_idx, None, false);
            }
            RecordedInput::Edit(text) => {
                self.focus_cell(cell.col_idx, cell.row_idx, true);
                self.type_text(&text, now);
            }
        }
    }

    // ── Lookup editor ───────────────────────────────────────────────

    /// Pick an option in the focused lookup cell's dropdown.
    ///
    /// Multi-value cells add the option and stay open; single-value cells
    /// replace their value and leave edit mode.
    pub fn choose_option(&mut self, option: ValueDescriptor) {
        let Some(cell) = self.selection.focused() else {
            return;
        };
        let multi = self.grid.column(cell.col_idx).is_some_and(|c| c.multi_value);
        if multi {
            self.modify_cell(cell.col_idx, cell.row_idx, &[option], ModificationType::Add);
            if let Some(editor) = self.editor.as_mut() {
                editor.buffer.clear();
                editor.dirty = false;
                editor.commit.cancel();
            }
        } else {
            self.editor = None;
            self.modify_cell(cell.col_idx, cell.row_idx, &[option], ModificationType::Replace);
            self.selection.unfocus();
            self.events.push(GridEvent::SelectionChanged(self.selection.state()));
        }
    }

    /// Remove one chosen option (the "x" on a multi-value chip).
    pub fn remove_option(&mut self, cell: CellCoordinates, option: &ValueDescriptor) {
        self.modify_cell(
            cell.col_idx,
            cell.row_idx,
            std::slice::from_ref(option),
            ModificationType::Remove,
        );
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Close the editor, writing its text if asked and it changed.
    fn finish_edit(&mut self, commit: bool) {
        self.search.cancel();
        let Some(editor) = self.editor.take() else {
            return;
        };
        if commit && editor.dirty {
            self.write_text(editor.cell, &editor.buffer);
        }
    }

    fn write(&mut self, cell: CellCoordinates, values: &[ValueDescriptor], kind: ModificationType) {
        self.grid.modify(cell, values, kind);
        self.grid.clear_message(cell);
    }

    fn write_text(&mut self, cell: CellCoordinates, text: &str) {
        let descriptors = self.descriptors_for_text(cell.col_idx, text);
        if descriptors.is_empty() {
            self.write(cell, &[], ModificationType::RemoveAll);
        } else {
            self.write(cell, &descriptors, ModificationType::Replace);
        }
        self.events.push(GridEvent::CellsChanged(vec![cell]));
    }

    /// Turn typed or pasted text into descriptors for a column.
    ///
    /// Lookup text resolves against the cache by display text, then raw key;
    /// valid values match case-insensitively to their canonical spelling.
    /// Multi-value columns split on commas. Unresolved text is kept as-is.
    fn descriptors_for_text(&self, col_idx: usize, text: &str) -> Vec<ValueDescriptor> {
        let Some(column) = self.grid.column(col_idx) else {
            return Vec::new();
        };
        let parts: Vec<&str> = if column.multi_value {
            text.split(',').collect()
        } else {
            vec![text]
        };

        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|part| match self.grid.renderer(col_idx) {
                Some(CellRenderer::Lookup(key)) => self
                    .lookups
                    .find_by_display(key, part)
                    .or_else(|| self.lookups.find_by_raw(key, &Value::String(part.to_string())))
                    .unwrap_or_else(|| ValueDescriptor::text(part)),
                Some(CellRenderer::ValidValues(values)) => values
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(part))
                    .map(|v| ValueDescriptor::text(v))
                    .unwrap_or_else(|| ValueDescriptor::text(part)),
                _ => ValueDescriptor::text(part),
            })
            .collect()
    }

    fn clear_selected_values(&mut self) {
        let Some(region) = self.selection.region() else {
            return;
        };
        let cells: Vec<CellCoordinates> = region
            .cells()
            .filter(|c| !self.grid.is_read_only(c.col_idx))
            .collect();
        for &cell in &cells {
            self.write(cell, &[], ModificationType::RemoveAll);
        }
        if !cells.is_empty() {
            self.events.push(GridEvent::CellsChanged(cells));
        }
    }
}

impl CellActions for GridController {
    fn focus_cell(&mut self, col_idx: usize, row_idx: usize, clear_existing_value: bool) {
        let cell = CellCoordinates::new(col_idx, row_idx);
        if self.grid.is_read_only(col_idx) {
            self.select_cell(col_idx, row_idx, None, false);
            return;
        }
        if self.editor.as_ref().is_some_and(|e| e.cell == cell) {
            return;
        }
        self.finish_edit(true);
        self.recorder.cancel();

        let buffer = if clear_existing_value {
            String::new()
        } else {
            self.grid.display_text(cell)
        };
        self.editor = Some(EditSession {
            cell,
            buffer,
            dirty: false,
            commit: Debouncer::new(self.timing.commit),
        });
        self.selection.focus(cell);
        self.events.push(GridEvent::SelectionChanged(CellState::Focused));
        self.request_lookup_load(col_idx);
    }

    fn select_cell(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        selection_mode: Option<SelectionMode>,
        reset_value: bool,
    ) {
        let cell = CellCoordinates::new(col_idx, row_idx);
        self.finish_edit(!reset_value);
        self.recorder.cancel();

        match selection_mode.unwrap_or_default() {
            SelectionMode::Single => self.selection.select_cell(cell),
            SelectionMode::Area => self.selection.extend_to(cell),
            SelectionMode::All => {
                if let Some(full) = self.grid.full_range() {
                    self.selection.select_all(full);
                }
            }
        }
        self.events.push(GridEvent::SelectionChanged(self.selection.state()));
    }

    fn modify_cell(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        new_values: &[ValueDescriptor],
        modification_type: ModificationType,
    ) {
        let cell = CellCoordinates::new(col_idx, row_idx);
        self.write(cell, new_values, modification_type);
        self.events.push(GridEvent::CellsChanged(vec![cell]));
    }

    fn clear_selection(&mut self) {
        self.finish_edit(true);
        self.recorder.cancel();
        self.selection.clear();
        self.events.push(GridEvent::SelectionChanged(CellState::Idle));
    }

    fn fill_down(&mut self) {
        self.finish_edit(true);
        let Some(region) = self.selection.region() else {
            return;
        };
        if region.start_row == region.end_row {
            return;
        }

        let mut changed = Vec::new();
        for col in region.start_col..=region.end_col {
            if self.grid.is_read_only(col) {
                continue;
            }
            let source = self.grid.values(CellCoordinates::new(col, region.start_row)).to_vec();
            for row in region.start_row + 1..=region.end_row {
                let cell = CellCoordinates::new(col, row);
                self.write(cell, &source, ModificationType::Replace);
                changed.push(cell);
            }
        }

        if !changed.is_empty() {
            self.events.push(GridEvent::CellsChanged(changed));
        }
    }

    fn fill_text(&mut self, col_idx: usize, row_idx: usize, text: &str) {
        self.finish_edit(true);
        let rows = parse_paste(text);
        if rows.is_empty() {
            return;
        }

        let (width, height) = paste_extent(&rows);
        let needed = row_idx + height;
        if needed > self.grid.row_count() {
            self.add_rows(needed - self.grid.row_count());
        }

        let last_col = (col_idx + width.max(1) - 1).min(self.grid.column_count().saturating_sub(1));

        let mut changed = Vec::new();
        let mut dropped = 0usize;
        for (r_off, values) in rows.iter().enumerate() {
            for (c_off, value) in values.iter().enumerate() {
                let target_col = col_idx + c_off;
                if target_col >= self.grid.column_count() {
                    dropped += 1;
                    continue;
                }
                if self.grid.is_read_only(target_col) {
                    continue;
                }
                let cell = CellCoordinates::new(target_col, row_idx + r_off);
                let descriptors = self.descriptors_for_text(target_col, value);
                if descriptors.is_empty() {
                    self.write(cell, &[], ModificationType::RemoveAll);
                } else {
                    self.write(cell, &descriptors, ModificationType::Replace);
                }
                changed.push(cell);
            }
        }

        if dropped > 0 {
            log::debug!(
                "Paste at {} dropped {} value(s) past the last column",
                CellCoordinates::new(col_idx, row_idx),
                dropped
            );
        }
        if !changed.is_empty() {
            self.events.push(GridEvent::CellsChanged(changed));
        }

        let anchor = CellCoordinates::new(col_idx, row_idx);
        self.selection.select_cell(anchor);
        self.selection.extend_to(CellCoordinates::new(last_col, row_idx + height - 1));
        self.events.push(GridEvent::SelectionChanged(self.selection.state()));
    }

    fn in_drag(&self) -> bool {
        self.selection.in_drag()
    }
}
