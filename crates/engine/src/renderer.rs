//! Which editor a column's cells use.

use labgrid_query_client::QueryColumn;

use crate::lookup::LookupKey;

/// Closed set of cell editor variants, resolved from column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellRenderer {
    PlainText,
    DateTime,
    /// Choice among the column's fixed valid values.
    ValidValues(Vec<String>),
    Lookup(LookupKey),
    /// Application-registered input component.
    Custom(String),
}

impl CellRenderer {
    /// Resolve the editor for a column.
    ///
    /// Precedence: custom input, public lookup, valid values, date/time,
    /// plain text. Restricted lookups fall through to plain text.
    pub fn for_column(column: &QueryColumn) -> Self {
        if let Some(name) = &column.input_renderer {
            return Self::Custom(name.clone());
        }
        if let Some(lookup) = column.lookup.as_ref().filter(|l| l.is_public) {
            return Self::Lookup(LookupKey::for_lookup(lookup));
        }
        if let Some(values) = column.valid_values.as_ref().filter(|v| !v.is_empty()) {
            return Self::ValidValues(values.clone());
        }
        if column.is_date_type() {
            return Self::DateTime;
        }
        Self::PlainText
    }

    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }

    /// Escape throws away an in-progress edit for pickers instead of committing it.
    pub fn discards_on_escape(&self) -> bool {
        matches!(self, Self::Lookup(_) | Self::DateTime)
    }
}
