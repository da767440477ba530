//! Wire types for the query API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// Schema / query / optional view triple naming a remote table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaQuery {
    pub schema_name: String,
    pub query_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
}

impl SchemaQuery {
    pub fn new(schema_name: impl Into<String>, query_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            query_name: query_name.into(),
            view_name: None,
        }
    }

    pub fn with_view(mut self, view_name: impl Into<String>) -> Self {
        self.view_name = Some(view_name.into());
        self
    }
}

impl std::fmt::Display for SchemaQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.query_name)?;
        if let Some(view) = &self.view_name {
            write!(f, ".{}", view)?;
        }
        Ok(())
    }
}

/// Target of a lookup (foreign-key-like) column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupInfo {
    pub schema_name: String,
    pub query_name: String,
    pub key_column: String,
    pub display_column: String,
    /// Browsable lookups get a search dropdown; restricted ones render as text.
    #[serde(rename = "public", default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

impl LookupInfo {
    pub fn new(
        schema_name: impl Into<String>,
        query_name: impl Into<String>,
        key_column: impl Into<String>,
        display_column: impl Into<String>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            query_name: query_name.into(),
            key_column: key_column.into(),
            display_column: display_column.into(),
            is_public: true,
        }
    }

    pub fn schema_query(&self) -> SchemaQuery {
        SchemaQuery::new(&self.schema_name, &self.query_name)
    }
}

/// Column metadata as returned by the query API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryColumn {
    pub field_key: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default = "default_json_type")]
    pub json_type: String,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multi_value: bool,
    #[serde(default)]
    pub is_key_field: bool,
    #[serde(default)]
    pub lookup: Option<LookupInfo>,
    #[serde(default)]
    pub valid_values: Option<Vec<String>>,
    /// Name of an application-registered input component.
    #[serde(default)]
    pub input_renderer: Option<String>,
}

fn default_json_type() -> String {
    "string".to_string()
}

impl QueryColumn {
    pub fn new(field_key: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            caption: None,
            json_type: default_json_type(),
            input_type: None,
            read_only: false,
            required: false,
            multi_value: false,
            is_key_field: false,
            lookup: None,
            valid_values: None,
            input_renderer: None,
        }
    }

    pub fn with_json_type(mut self, json_type: impl Into<String>) -> Self {
        self.json_type = json_type.into();
        self
    }

    pub fn with_lookup(mut self, lookup: LookupInfo) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_valid_values(mut self, values: Vec<String>) -> Self {
        self.valid_values = Some(values);
        self
    }

    pub fn with_input_renderer(mut self, name: impl Into<String>) -> Self {
        self.input_renderer = Some(name.into());
        self
    }

    pub fn multi_value(mut self) -> Self {
        self.multi_value = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.field_key)
    }

    pub fn is_public_lookup(&self) -> bool {
        self.lookup.as_ref().is_some_and(|l| l.is_public)
    }

    pub fn is_date_type(&self) -> bool {
        self.json_type == "date"
            || matches!(self.input_type.as_deref(), Some("date" | "datetime" | "time"))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.json_type.as_str(), "int" | "float")
    }
}

/// Filter comparison supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    NotEq,
    Contains,
    StartsWith,
    In,
}

impl FilterOp {
    pub fn url_suffix(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::NotEq => "neq",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startswith",
            FilterOp::In => "in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `query.<column>~<op>` = value
    pub fn url_param(&self) -> (String, String) {
        (
            format!("query.{}~{}", self.column, self.op.url_suffix()),
            self.value.clone(),
        )
    }
}

/// One field of a fetched row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
}

impl FieldValue {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            display_value: None,
            formatted_value: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<Value>) -> Self {
        self.display_value = Some(display.into());
        self
    }

    /// Accepts either `{value, displayValue, formattedValue}` or a bare scalar.
    pub fn from_json(json: &Value) -> Self {
        match json {
            Value::Object(obj) if obj.contains_key("value") => Self {
                value: obj.get("value").cloned().unwrap_or(Value::Null),
                display_value: obj.get("displayValue").filter(|v| !v.is_null()).cloned(),
                formatted_value: obj
                    .get("formattedValue")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            },
            other => Self::new(other.clone()),
        }
    }
}

/// A fetched row: field key -> field value.
pub type QueryRow = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectRowsRequest {
    pub schema_query: Option<SchemaQuery>,
    pub columns: Vec<String>,
    pub sort: Option<String>,
    pub filters: Vec<Filter>,
    pub max_rows: Option<usize>,
}

impl SelectRowsRequest {
    pub fn new(schema_query: SchemaQuery) -> Self {
        Self {
            schema_query: Some(schema_query),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectRowsResponse {
    pub rows: Vec<QueryRow>,
    /// Total matching rows on the server (may exceed `rows.len()`).
    pub row_count: usize,
}

impl SelectRowsResponse {
    /// Parse a select-rows response body.
    ///
    /// Rows may be flat objects or wrapped as `{"data": {...}}`.
    pub fn from_json(json: &Value) -> Result<Self, QueryError> {
        let rows_json = json["rows"]
            .as_array()
            .ok_or_else(|| QueryError::Parse("Missing rows in response".into()))?;

        let mut rows = Vec::with_capacity(rows_json.len());
        for row in rows_json {
            let fields = row
                .get("data")
                .and_then(Value::as_object)
                .or_else(|| row.as_object())
                .ok_or_else(|| QueryError::Parse("Row is not an object".into()))?;
            rows.push(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                    .collect(),
            );
        }

        let row_count = json["rowCount"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(rows.len());

        Ok(Self { rows, row_count })
    }
}

/// Search a lookup target by free-text token.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupSearchRequest {
    pub lookup: LookupInfo,
    pub token: Option<String>,
    /// Also fetch an exact display-column match, which may fall outside the page.
    pub exact_match: bool,
    pub max_rows: usize,
}

impl LookupSearchRequest {
    pub fn new(lookup: LookupInfo, max_rows: usize) -> Self {
        Self {
            lookup,
            token: None,
            exact_match: false,
            max_rows,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_exact_match(mut self) -> Self {
        self.exact_match = true;
        self
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn columns(&self) -> Vec<String> {
        let mut columns = vec![self.lookup.key_column.clone()];
        if self.lookup.display_column != self.lookup.key_column {
            columns.push(self.lookup.display_column.clone());
        }
        columns
    }

    /// The paged "contains" query.
    pub fn to_select_request(&self) -> SelectRowsRequest {
        let mut req = SelectRowsRequest::new(self.lookup.schema_query());
        req.columns = self.columns();
        req.sort = Some(self.lookup.display_column.clone());
        req.max_rows = Some(self.max_rows);
        if let Some(token) = self.token() {
            req.filters
                .push(Filter::new(&self.lookup.display_column, FilterOp::Contains, token));
        }
        req
    }

    /// The exact-match query, when requested and a token is present.
    pub fn exact_request(&self) -> Option<SelectRowsRequest> {
        if !self.exact_match {
            return None;
        }
        let token = self.token()?;
        let mut req = SelectRowsRequest::new(self.lookup.schema_query());
        req.columns = self.columns();
        req.max_rows = Some(1);
        req.filters
            .push(Filter::new(&self.lookup.display_column, FilterOp::Eq, token));
        Some(req)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LookupSearchResponse {
    pub rows: Vec<QueryRow>,
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_metadata_from_json() {
        let col: QueryColumn = serde_json::from_value(json!({
            "fieldKey": "SampleType",
            "jsonType": "int",
            "required": true,
            "lookup": {
                "schemaName": "exp",
                "queryName": "SampleSets",
                "keyColumn": "RowId",
                "displayColumn": "Name"
            }
        }))
        .unwrap();

        assert_eq!(col.field_key, "SampleType");
        assert_eq!(col.caption(), "SampleType");
        assert!(col.required);
        assert!(col.is_numeric());
        assert!(col.is_public_lookup());
        assert!(!col.read_only);
    }

    #[test]
    fn test_restricted_lookup() {
        let col = QueryColumn::new("Owner").with_lookup(LookupInfo {
            is_public: false,
            ..LookupInfo::new("core", "Users", "UserId", "DisplayName")
        });
        assert!(!col.is_public_lookup());
    }

    #[test]
    fn test_date_type_detection() {
        assert!(QueryColumn::new("Created").with_json_type("date").is_date_type());
        let mut col = QueryColumn::new("RunTime");
        col.input_type = Some("time".into());
        assert!(col.is_date_type());
        assert!(!QueryColumn::new("Name").is_date_type());
    }

    #[test]
    fn test_filter_url_param() {
        let f = Filter::new("Name", FilterOp::Contains, "abc");
        assert_eq!(f.url_param(), ("query.Name~contains".into(), "abc".into()));
    }

    #[test]
    fn test_field_value_from_json() {
        let f = FieldValue::from_json(
            &json!({"value": 3, "displayValue": "Plate 3", "formattedValue": "3"}),
        );
        assert_eq!(f.value, json!(3));
        assert_eq!(f.display_value, Some(json!("Plate 3")));
        assert_eq!(f.formatted_value.as_deref(), Some("3"));

        let bare = FieldValue::from_json(&json!("x"));
        assert_eq!(bare.value, json!("x"));
        assert!(bare.display_value.is_none());
    }

    #[test]
    fn test_select_rows_response_wrapped_and_flat() {
        let wrapped = json!({
            "rowCount": 10,
            "rows": [{"data": {"RowId": {"value": 1}, "Name": {"value": "A"}}}]
        });
        let resp = SelectRowsResponse::from_json(&wrapped).unwrap();
        assert_eq!(resp.row_count, 10);
        assert_eq!(resp.rows[0]["Name"].value, json!("A"));

        let flat = json!({"rows": [{"RowId": 2}]});
        let resp = SelectRowsResponse::from_json(&flat).unwrap();
        assert_eq!(resp.row_count, 1);
        assert_eq!(resp.rows[0]["RowId"].value, json!(2));

        assert!(SelectRowsResponse::from_json(&json!({})).is_err());
    }

    #[test]
    fn test_lookup_search_requests() {
        let lookup = LookupInfo::new("exp", "Materials", "RowId", "Name");
        let req = LookupSearchRequest::new(lookup, 50).with_token("  S-1 ").with_exact_match();

        let select = req.to_select_request();
        assert_eq!(select.columns, vec!["RowId", "Name"]);
        assert_eq!(select.max_rows, Some(50));
        assert_eq!(select.filters, vec![Filter::new("Name", FilterOp::Contains, "S-1")]);

        let exact = req.exact_request().unwrap();
        assert_eq!(exact.filters, vec![Filter::new("Name", FilterOp::Eq, "S-1")]);

        let blank = LookupSearchRequest::new(req.lookup.clone(), 50)
            .with_token(" ")
            .with_exact_match();
        assert!(blank.to_select_request().filters.is_empty());
        assert!(blank.exact_request().is_none());
    }
}
