// Grid <-> query API row mapping
//
// Load turns fetched rows into one descriptor list per cell. Save walks the
// grid and builds insert/update row objects holding only non-blank values.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use labgrid_core::value::is_blank_value;
use labgrid_core::{CellCoordinates, CellValues, ModificationType, ValueDescriptor};
use labgrid_engine::{CellMessage, EditableGrid, LookupCache, LookupKey, RowId};
use labgrid_query_client::{
    FieldValue, QueryApi, QueryColumn, QueryError, QueryRow, SchemaQuery, SelectRowsResponse,
};

// ============================================================================
// Load
// ============================================================================

/// Build a grid from fetched rows.
///
/// `key_field` names the row identifier column; rows without one load as new.
pub fn load_grid(
    columns: Vec<QueryColumn>,
    response: &SelectRowsResponse,
    key_field: &str,
    lookups: &LookupCache,
) -> EditableGrid {
    let row_ids = response
        .rows
        .iter()
        .map(|row| match field_of(row, key_field) {
            Some(f) if !is_blank_value(&f.value) => RowId::Existing(f.value.clone()),
            _ => RowId::New,
        })
        .collect();
    let mut grid = EditableGrid::new(columns.clone(), row_ids);

    for (row_idx, row) in response.rows.iter().enumerate() {
        for (col_idx, column) in columns.iter().enumerate() {
            let Some(field) = field_of(row, &column.field_key) else {
                continue;
            };
            let descriptors = descriptors_from_field(column, field, lookups);
            if !descriptors.is_empty() {
                grid.modify(
                    CellCoordinates::new(col_idx, row_idx),
                    &descriptors,
                    ModificationType::Replace,
                );
            }
        }
    }

    log::debug!(
        "Loaded {} row(s) x {} column(s) into grid",
        grid.row_count(),
        grid.column_count()
    );
    grid
}

/// Field by exact key, falling back to a case-insensitive match.
fn field_of<'a>(row: &'a QueryRow, key: &str) -> Option<&'a FieldValue> {
    row.get(key).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Descriptors for one fetched field. Arrays load as multiple values.
pub fn descriptors_from_field(
    column: &QueryColumn,
    field: &FieldValue,
    lookups: &LookupCache,
) -> Vec<ValueDescriptor> {
    let display = field
        .display_value
        .clone()
        .or_else(|| field.formatted_value.clone().map(Value::String));

    match &field.value {
        Value::Array(raws) => {
            let displays = match display {
                Some(Value::Array(d)) => d,
                _ => Vec::new(),
            };
            raws.iter()
                .enumerate()
                .filter_map(|(i, raw)| {
                    descriptor_for(column, raw, displays.get(i).cloned(), lookups)
                })
                .collect()
        }
        raw => descriptor_for(column, raw, display, lookups)
            .into_iter()
            .collect(),
    }
}

fn descriptor_for(
    column: &QueryColumn,
    raw: &Value,
    display: Option<Value>,
    lookups: &LookupCache,
) -> Option<ValueDescriptor> {
    if is_blank_value(raw) {
        return None;
    }
    if let Some(display) = display.filter(|d| !is_blank_value(d)) {
        return Some(ValueDescriptor::new(raw.clone(), display));
    }
    // Numeric lookup keys: use a richer display when the cache already has it
    if raw.is_number() {
        if let Some(lookup) = column.lookup.as_ref() {
            if let Some(known) = lookups.find_by_raw(&LookupKey::for_lookup(lookup), raw) {
                return Some(ValueDescriptor::new(raw.clone(), known.display));
            }
        }
    }
    Some(ValueDescriptor::new(raw.clone(), raw.clone()))
}

// ============================================================================
// Save
// ============================================================================

/// Row objects ready for the insert and update endpoints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavePayload {
    pub inserts: Vec<Map<String, Value>>,
    pub updates: Vec<Map<String, Value>>,
}

impl SavePayload {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveError {
    /// Required cells are blank; the grid now carries a message on each.
    Invalid(usize),
    Query(QueryError),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Invalid(count) => write!(f, "{} required value(s) missing", count),
            SaveError::Query(e) => write!(f, "Save failed: {}", e),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<QueryError> for SaveError {
    fn from(e: QueryError) -> Self {
        SaveError::Query(e)
    }
}

/// Build insert/update payloads from the grid.
///
/// Blank cells are omitted, never sent as "". Read-only columns are not
/// sent. Rows with nothing to send are skipped. Existing rows carry their
/// key (an object key contributes each of its fields).
pub fn build_save_payload(grid: &EditableGrid, key_field: &str) -> SavePayload {
    let mut payload = SavePayload::default();

    for (row_idx, row_id) in grid.row_ids().iter().enumerate() {
        let mut row = Map::new();
        for (col_idx, values) in grid.row_cells(row_idx) {
            let Some(column) = grid.column(col_idx) else {
                continue;
            };
            if column.read_only {
                continue;
            }
            if let Some(value) = cell_payload(column, values) {
                row.insert(column.field_key.clone(), value);
            }
        }
        if row.is_empty() {
            continue;
        }

        match row_id {
            RowId::New => payload.inserts.push(row),
            RowId::Existing(Value::Object(keys)) => {
                for (k, v) in keys {
                    row.insert(k.clone(), v.clone());
                }
                payload.updates.push(row);
            }
            RowId::Existing(key) => {
                row.insert(key_field.to_string(), key.clone());
                payload.updates.push(row);
            }
        }
    }

    payload
}

/// Payload value for one cell, or `None` when it reduces to blank.
fn cell_payload(column: &QueryColumn, values: &CellValues) -> Option<Value> {
    let mut scalars = values.iter().filter_map(|d| scalar_payload(column, &d.raw));
    if column.multi_value {
        let all: Vec<Value> = scalars.collect();
        if all.is_empty() {
            None
        } else {
            Some(Value::Array(all))
        }
    } else {
        scalars.next()
    }
}

fn scalar_payload(column: &QueryColumn, raw: &Value) -> Option<Value> {
    match raw {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if column.is_date_type() {
                Some(Value::String(
                    normalize_date(trimmed).unwrap_or_else(|| trimmed.to_string()),
                ))
            } else if column.is_numeric() {
                Some(numeric_text(trimmed).unwrap_or_else(|| Value::String(trimmed.to_string())))
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        other => Some(other.clone()),
    }
}

/// Typed or pasted text in a numeric column, as a JSON number.
fn numeric_text(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

const DATE_TIME_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"),
    ("%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"),
    ("%Y/%m/%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"),
    ("%m/%d/%Y %H:%M:%S", "%Y-%m-%d %H:%M:%S"),
    ("%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M"),
    ("%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"),
    ("%Y/%m/%d %H:%M", "%Y-%m-%d %H:%M"),
    ("%m/%d/%Y %H:%M", "%Y-%m-%d %H:%M"),
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

/// Normalize common date/time spellings to `YYYY-MM-DD[ HH:MM[:SS]]`.
pub fn normalize_date(text: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local().format("%Y-%m-%d %H:%M:%S").to_string());
    }
    for (input, output) in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, input) {
            return Some(dt.format(output).to_string());
        }
    }
    for input in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, input) {
            return Some(d.format("%Y-%m-%d").to_string());
        }
    }
    None
}

// ============================================================================
// Validation
// ============================================================================

/// Mark blank required cells with a message; clear stale messages elsewhere.
///
/// Rows with no values at all are ignored, since save skips them. Returns
/// the number of cells flagged.
pub fn apply_required_validation(grid: &mut EditableGrid) -> usize {
    let required: Vec<(usize, String)> = grid
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.required && !c.read_only)
        .map(|(i, c)| (i, format!("{} is required", c.caption())))
        .collect();

    let mut flagged = 0;
    for row_idx in 0..grid.row_count() {
        let row_has_values = grid.row_cells(row_idx).any(|(_, v)| !v.is_blank());
        for (col_idx, message) in &required {
            let cell = CellCoordinates::new(*col_idx, row_idx);
            if row_has_values && grid.cell_values(cell).is_blank() {
                grid.set_message(cell, CellMessage::new(message.clone()));
                flagged += 1;
            } else {
                grid.clear_message(cell);
            }
        }
    }

    if flagged > 0 {
        log::info!("Validation flagged {} blank required cell(s)", flagged);
    }
    flagged
}

/// Send a payload: inserts first, then updates. Empty lists are not sent.
pub fn save(
    api: &dyn QueryApi,
    target: &SchemaQuery,
    payload: &SavePayload,
) -> Result<SaveSummary, QueryError> {
    if !payload.inserts.is_empty() {
        api.insert_rows(target, &payload.inserts)?;
    }
    if !payload.updates.is_empty() {
        api.update_rows(target, &payload.updates)?;
    }
    let summary = SaveSummary {
        inserted: payload.inserts.len(),
        updated: payload.updates.len(),
    };
    log::info!(
        "Saved {}: {} inserted, {} updated",
        target,
        summary.inserted,
        summary.updated
    );
    Ok(summary)
}

/// Validate, build and send in one step.
pub fn save_grid(
    api: &dyn QueryApi,
    target: &SchemaQuery,
    grid: &mut EditableGrid,
    key_field: &str,
) -> Result<SaveSummary, SaveError> {
    let invalid = apply_required_validation(grid);
    if invalid > 0 {
        return Err(SaveError::Invalid(invalid));
    }
    let payload = build_save_payload(grid, key_field);
    Ok(save(api, target, &payload)?)
}
