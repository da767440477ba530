//! Cell values.
//!
//! A cell holds an ordered list of [`ValueDescriptor`]s. Most cells hold one;
//! multi-value lookup cells hold one per selected option. The list is only
//! ever changed through [`CellValues::apply`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One value occupying a cell: the stored key plus what the user sees.
///
/// `Value::Null` stands for "undefined" on either side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueDescriptor {
    pub raw: Value,
    pub display: Value,
}

impl ValueDescriptor {
    pub fn new(raw: impl Into<Value>, display: impl Into<Value>) -> Self {
        Self {
            raw: raw.into(),
            display: display.into(),
        }
    }

    /// Descriptor whose raw and display value are the same text.
    pub fn text(s: &str) -> Self {
        Self::new(s, s)
    }

    /// Descriptor with no raw and no display value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the raw value is null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        is_blank_value(&self.raw)
    }

    /// Text shown to the user: the display value, falling back to raw.
    pub fn display_text(&self) -> String {
        if self.display.is_null() {
            value_to_text(&self.raw)
        } else {
            value_to_text(&self.display)
        }
    }
}

/// Render a loosely typed value as cell text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// True for null, empty/whitespace strings, and arrays of blanks.
pub fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank_value),
        _ => false,
    }
}

/// How a modification combines new values with a cell's existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationType {
    /// Append each value not already present (raw + display equality).
    Add,
    /// Overwrite the whole list.
    Replace,
    /// Delete the first descriptor matching each value.
    Remove,
    /// Clear the list.
    RemoveAll,
}

/// Ordered list of descriptors held by one cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellValues(Vec<ValueDescriptor>);

impl CellValues {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(value: ValueDescriptor) -> Self {
        Self(vec![value])
    }

    pub fn from_vec(values: Vec<ValueDescriptor>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[ValueDescriptor] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueDescriptor> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&ValueDescriptor> {
        self.0.first()
    }

    pub fn contains(&self, value: &ValueDescriptor) -> bool {
        self.0.contains(value)
    }

    /// True when every descriptor is blank (or there are none).
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(ValueDescriptor::is_blank)
    }

    /// Display text of all descriptors, comma separated.
    pub fn display_text(&self) -> String {
        self.0
            .iter()
            .map(ValueDescriptor::display_text)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Apply a modification in place.
    pub fn apply(&mut self, new_values: &[ValueDescriptor], kind: ModificationType) {
        match kind {
            ModificationType::Replace => {
                self.0 = new_values.to_vec();
            }
            ModificationType::Add => {
                for value in new_values {
                    if !self.0.contains(value) {
                        self.0.push(value.clone());
                    }
                }
            }
            ModificationType::Remove => {
                for value in new_values {
                    if let Some(pos) = self.0.iter().position(|v| v == value) {
                        self.0.remove(pos);
                    }
                }
            }
            ModificationType::RemoveAll => {
                self.0.clear();
            }
        }
    }
}

impl From<Vec<ValueDescriptor>> for CellValues {
    fn from(values: Vec<ValueDescriptor>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_is_idempotent() {
        let v = ValueDescriptor::new(7, "Sample 7");
        let mut once = CellValues::single(ValueDescriptor::text("old"));
        once.apply(&[v.clone()], ModificationType::Replace);
        let mut twice = once.clone();
        twice.apply(&[v.clone()], ModificationType::Replace);
        assert_eq!(once, twice);
        assert_eq!(twice.as_slice(), &[v]);
    }

    #[test]
    fn test_add_dedups_on_raw_and_display() {
        let v = ValueDescriptor::new(1, "One");
        let mut values = CellValues::new();
        values.apply(&[v.clone()], ModificationType::Add);
        values.apply(&[v.clone()], ModificationType::Add);
        assert_eq!(values.len(), 1);

        // Same raw, different display is a distinct descriptor
        values.apply(&[ValueDescriptor::new(1, "Uno")], ModificationType::Add);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_remove_first_match_only() {
        let a = ValueDescriptor::new(1, "A");
        let b = ValueDescriptor::new(2, "B");
        let mut values = CellValues::from_vec(vec![a.clone(), b.clone(), a.clone()]);
        values.apply(&[a.clone()], ModificationType::Remove);
        assert_eq!(values.as_slice(), &[b, a]);
    }

    #[test]
    fn test_remove_requires_display_match() {
        let mut values = CellValues::single(ValueDescriptor::new(1, "A"));
        values.apply(&[ValueDescriptor::new(1, "other")], ModificationType::Remove);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_remove_all_then_add() {
        let v = ValueDescriptor::text("x");
        let mut values = CellValues::from_vec(vec![
            ValueDescriptor::text("a"),
            ValueDescriptor::text("b"),
        ]);
        values.apply(&[], ModificationType::RemoveAll);
        values.apply(&[v.clone()], ModificationType::Add);
        assert_eq!(values.as_slice(), &[v]);
    }

    #[test]
    fn test_blank_detection() {
        assert!(ValueDescriptor::empty().is_blank());
        assert!(ValueDescriptor::text("   ").is_blank());
        assert!(!ValueDescriptor::new(0, "0").is_blank());
        assert!(is_blank_value(&json!(["", null])));
        assert!(CellValues::new().is_blank());
    }

    #[test]
    fn test_display_text_falls_back_to_raw() {
        assert_eq!(ValueDescriptor::new(42, Value::Null).display_text(), "42");
        assert_eq!(ValueDescriptor::new(42, "Plate 42").display_text(), "Plate 42");
        let values = CellValues::from_vec(vec![
            ValueDescriptor::new(1, "A"),
            ValueDescriptor::new(2, "B"),
        ]);
        assert_eq!(values.display_text(), "A, B");
    }

    #[test]
    fn test_cell_values_serialize_as_list() {
        let values = CellValues::single(ValueDescriptor::new(3, "C"));
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, json!([{"raw": 3, "display": "C"}]));
    }
}
