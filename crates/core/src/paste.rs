// Clipboard text -> rows of cell strings

/// Parse clipboard or typed text into rows of cell strings.
///
/// Rows split on newline (CRLF and lone CR included), cells on tab. Jagged
/// rows are kept as they are; a short row just has fewer cells. Trailing rows
/// that are whitespace-only are dropped. Never fails.
pub fn parse_paste(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = normalized.split('\n').collect();

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Width and height of a parsed paste block: (columns, rows).
pub fn paste_extent(rows: &[Vec<String>]) -> (usize, usize) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    (width, rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_by_two() {
        let rows = parse_paste("a\tb\nc\td");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_trailing_blank_rows_dropped() {
        let rows = parse_paste("a\tb\r\nc\td\r\n  \n\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c", "d"]);
    }

    #[test]
    fn test_interior_blank_row_kept() {
        let rows = parse_paste("a\n\nb");
        assert_eq!(rows, vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn test_jagged_rows() {
        let rows = parse_paste("a\tb\tc\n1\n\t2");
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1], vec!["1"]);
        assert_eq!(rows[2], vec!["", "2"]);
        assert_eq!(paste_extent(&rows), (3, 3));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_paste("").is_empty());
        assert!(parse_paste("\n \n").is_empty());
        assert_eq!(paste_extent(&[]), (0, 0));
    }

    #[test]
    fn test_scanner_value_with_enter() {
        assert_eq!(parse_paste("S-1001\n"), vec![vec!["S-1001"]]);
    }
}
