//! Change notifications emitted by the grid controller.
//!
//! The owning view drains these after each input to decide what to redraw
//! and what to persist.

use labgrid_core::{CellCoordinates, CellState};

use crate::lookup::LookupKey;

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Cell values changed through a modification.
    CellsChanged(Vec<CellCoordinates>),
    /// Rows appended at the end of the grid.
    RowsAdded { start: usize, count: usize },
    /// Rows removed (indices as they were before removal).
    RowsRemoved(Vec<usize>),
    /// Selection or focus state changed.
    SelectionChanged(CellState),
    /// A focused lookup cell needs its options loaded.
    LookupLoadRequested(LookupKey),
}

/// Ordered event buffer.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<GridEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GridEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GridEvent] {
        &self.events
    }

    /// Take all buffered events.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All cells reported changed, in order.
    pub fn changed_cells(&self) -> Vec<CellCoordinates> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GridEvent::CellsChanged(cells) => Some(cells.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_filtering_and_drain() {
        let mut collector = EventCollector::new();
        collector.push(GridEvent::SelectionChanged(CellState::Selected));
        collector.push(GridEvent::CellsChanged(vec![CellCoordinates::new(0, 0)]));
        collector.push(GridEvent::RowsAdded { start: 3, count: 2 });
        collector.push(GridEvent::CellsChanged(vec![CellCoordinates::new(1, 4)]));

        assert_eq!(collector.len(), 4);
        assert_eq!(
            collector.changed_cells(),
            vec![CellCoordinates::new(0, 0), CellCoordinates::new(1, 4)]
        );

        let drained = collector.drain();
        assert_eq!(drained.len(), 4);
        assert!(collector.is_empty());
    }
}
