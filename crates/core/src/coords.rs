//! Cell addressing.
//!
//! A `CellCoordinates` names one cell of the editable grid by zero-based
//! column and row. Coordinates may point outside the grid (Tab past the last
//! column, for instance); the grid owner decides whether to clamp or wrap.

use serde::{Deserialize, Serialize};

/// Zero-based (column, row) address of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoordinates {
    pub col_idx: usize,
    pub row_idx: usize,
}

impl CellCoordinates {
    #[inline]
    pub fn new(col_idx: usize, row_idx: usize) -> Self {
        Self { col_idx, row_idx }
    }

    /// Offset by a signed delta. Returns `None` if either index would go negative.
    pub fn offset(&self, d_col: isize, d_row: isize) -> Option<Self> {
        let col = self.col_idx.checked_add_signed(d_col)?;
        let row = self.row_idx.checked_add_signed(d_row)?;
        Some(Self::new(col, row))
    }
}

impl std::fmt::Display for CellCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col_idx), self.row_idx + 1)
    }
}

/// Convert 0-based column index to spreadsheet-style letter(s).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(CellCoordinates::new(0, 0));
        set.insert(CellCoordinates::new(0, 0)); // duplicate
        set.insert(CellCoordinates::new(1, 0));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(col_to_letters(701), "ZZ");
        assert_eq!(col_to_letters(702), "AAA");
    }

    #[test]
    fn test_display() {
        assert_eq!(CellCoordinates::new(0, 0).to_string(), "A1");
        assert_eq!(CellCoordinates::new(26, 9).to_string(), "AA10");
    }

    #[test]
    fn test_offset() {
        let c = CellCoordinates::new(1, 1);
        assert_eq!(c.offset(1, -1), Some(CellCoordinates::new(2, 0)));
        assert_eq!(c.offset(-2, 0), None);
        // Out of grid bounds is fine here; only negatives are rejected
        assert_eq!(c.offset(100, 0), Some(CellCoordinates::new(101, 1)));
    }
}
