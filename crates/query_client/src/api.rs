//! The query API seam.

use serde_json::{Map, Value};

use crate::error::QueryError;
use crate::types::{
    LookupSearchRequest, LookupSearchResponse, SchemaQuery, SelectRowsRequest, SelectRowsResponse,
};

/// Remote tabular query API (blocking).
///
/// `HttpQueryApi` talks to a real server; tests supply in-memory fakes.
pub trait QueryApi: Send + Sync {
    fn select_rows(&self, req: &SelectRowsRequest) -> Result<SelectRowsResponse, QueryError>;

    fn insert_rows(
        &self,
        target: &SchemaQuery,
        rows: &[Map<String, Value>],
    ) -> Result<(), QueryError>;

    /// Each row carries its existing key field(s) plus the updated fields.
    fn update_rows(
        &self,
        target: &SchemaQuery,
        rows: &[Map<String, Value>],
    ) -> Result<(), QueryError>;

    /// Filtered page of lookup options plus the total match count.
    ///
    /// With `exact_match`, an exact display-column hit is moved to the front
    /// even when it falls outside the page.
    fn search_lookup(&self, req: &LookupSearchRequest) -> Result<LookupSearchResponse, QueryError> {
        let page = self.select_rows(&req.to_select_request())?;
        let mut rows = page.rows;

        if let Some(exact) = req.exact_request() {
            let key = &req.lookup.key_column;
            for row in self.select_rows(&exact)?.rows.into_iter().rev() {
                let raw = row.get(key).map(|f| &f.value);
                if let Some(pos) = rows.iter().position(|r| r.get(key).map(|f| &f.value) == raw) {
                    let hit = rows.remove(pos);
                    rows.insert(0, hit);
                } else {
                    rows.insert(0, row);
                }
            }
        }

        // An exact hit also matches the contains filter, so it is already counted
        Ok(LookupSearchResponse { rows, total_count: page.row_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, FilterOp, LookupInfo, QueryRow};
    use serde_json::json;

    /// Serves a fixed table and applies contains/eq filters on one column.
    struct FakeTable {
        rows: Vec<(i64, &'static str)>,
    }

    impl QueryApi for FakeTable {
        fn select_rows(&self, req: &SelectRowsRequest) -> Result<SelectRowsResponse, QueryError> {
            let matching: Vec<QueryRow> = self
                .rows
                .iter()
                .filter(|(_, name)| {
                    req.filters.iter().all(|f| match f.op {
                        FilterOp::Contains => name.contains(f.value.as_str()),
                        FilterOp::Eq => *name == f.value,
                        _ => true,
                    })
                })
                .map(|(id, name)| {
                    let mut row = QueryRow::new();
                    row.insert("RowId".into(), FieldValue::new(*id));
                    row.insert("Name".into(), FieldValue::new(*name));
                    row
                })
                .collect();
            let row_count = matching.len();
            let rows = matching.into_iter().take(req.max_rows.unwrap_or(usize::MAX)).collect();
            Ok(SelectRowsResponse { rows, row_count })
        }

        fn insert_rows(&self, _: &SchemaQuery, _: &[Map<String, Value>]) -> Result<(), QueryError> {
            Ok(())
        }

        fn update_rows(&self, _: &SchemaQuery, _: &[Map<String, Value>]) -> Result<(), QueryError> {
            Ok(())
        }
    }

    fn table() -> FakeTable {
        FakeTable {
            rows: vec![(1, "S-10"), (2, "S-100"), (3, "S-1"), (4, "T-5")],
        }
    }

    #[test]
    fn test_search_counts_all_matches() {
        let lookup = LookupInfo::new("exp", "Materials", "RowId", "Name");
        let resp = table()
            .search_lookup(&LookupSearchRequest::new(lookup, 2).with_token("S-"))
            .unwrap();
        assert_eq!(resp.rows.len(), 2);
        assert_eq!(resp.total_count, 3);
    }

    #[test]
    fn test_exact_match_moves_to_front() {
        let lookup = LookupInfo::new("exp", "Materials", "RowId", "Name");
        // Page of 1 would only contain S-10; the exact hit S-1 is pulled in
        let resp = table()
            .search_lookup(
                &LookupSearchRequest::new(lookup, 1)
                    .with_token("S-1")
                    .with_exact_match(),
            )
            .unwrap();
        assert_eq!(resp.rows[0]["Name"].value, json!("S-1"));
        assert_eq!(resp.rows.len(), 2);
        assert_eq!(resp.total_count, 3);
    }

    #[test]
    fn test_exact_match_already_on_page_not_duplicated() {
        let lookup = LookupInfo::new("exp", "Materials", "RowId", "Name");
        let resp = table()
            .search_lookup(
                &LookupSearchRequest::new(lookup, 10)
                    .with_token("T-5")
                    .with_exact_match(),
            )
            .unwrap();
        assert_eq!(resp.rows.len(), 1);
        assert_eq!(resp.total_count, 1);
    }
}
