//! Row representation and equality conditions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row: column name -> value
pub type Row = serde_json::Map<String, Value>;

/// Equality predicate on one column.
///
/// A `null` value matches SQL NULL (`IS NULL`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Ordered result of a multi-row read
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowSet {
    /// Column names in schema order, hidden columns excluded unless requested
    pub columns: Vec<String>,
    /// Matching rows in insertion order
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
