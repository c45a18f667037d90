//! Column schemas
//!
//! A schema is the ordered column list of one table. It is built once when the
//! table is constructed and never changes afterwards; tables share it through
//! an `Arc`. All row and condition validation happens here so engines only ever
//! see identifiers that passed `is_identifier`.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::condition::{Condition, Row};
use crate::error::{Result, TableError};

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Text,
    Integer,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

/// One column descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    /// Maximum character count for text columns
    pub max_length: Option<usize>,
    pub is_primary: bool,
    pub column_type: ColumnType,
    /// Excluded from reads unless the caller asks for hidden values
    pub hidden: bool,
}

impl Column {
    pub fn text(name: impl Into<String>, max_length: usize) -> Self {
        Self {
            name: name.into(),
            max_length: Some(max_length),
            is_primary: false,
            column_type: ColumnType::Text,
            hidden: false,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length: None,
            is_primary: false,
            column_type: ColumnType::Integer,
            hidden: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Check one value against type and length
    fn check_value(&self, value: &Value) -> Result<()> {
        match (self.column_type, value) {
            (_, Value::Null) => Err(TableError::MissingField(self.name.clone())),
            (ColumnType::Text, Value::String(s)) => {
                let actual = s.chars().count();
                match self.max_length {
                    Some(max_length) if actual > max_length => Err(TableError::ValueTooLong {
                        column: self.name.clone(),
                        max_length,
                        actual,
                    }),
                    _ => Ok(()),
                }
            }
            (ColumnType::Integer, Value::Number(n)) if n.is_i64() => Ok(()),
            (expected, _) => Err(TableError::TypeMismatch {
                column: self.name.clone(),
                expected,
            }),
        }
    }
}

/// Plain SQL identifier: ASCII alphanumerics and `_`, not starting with a digit
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Immutable table definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    table_name: String,
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(TableError::InvalidIdentifier(table_name));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !is_identifier(&column.name) {
                return Err(TableError::InvalidIdentifier(column.name.clone()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn {
                    table: table_name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self {
            table_name,
            columns,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary)
    }

    /// Columns returned by a read
    pub fn visible_columns(&self, show_hidden: bool) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| show_hidden || !c.hidden)
    }

    fn known_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| TableError::UnknownColumn {
            table: self.table_name.clone(),
            column: name.to_string(),
        })
    }

    /// A new row must name every column exactly, with valid values
    pub fn validate_insert(&self, row: &Row) -> Result<()> {
        for name in row.keys() {
            self.known_column(name)?;
        }
        for column in &self.columns {
            let value = row
                .get(&column.name)
                .ok_or_else(|| TableError::MissingField(column.name.clone()))?;
            column.check_value(value)?;
        }
        Ok(())
    }

    pub fn validate_update(&self, values: &Row) -> Result<()> {
        if values.is_empty() {
            return Err(TableError::EmptyUpdate);
        }
        for (name, value) in values {
            self.known_column(name)?.check_value(value)?;
        }
        Ok(())
    }

    pub fn validate_conditions(&self, conditions: &[Condition]) -> Result<()> {
        for condition in conditions {
            self.known_column(&condition.column)?;
        }
        Ok(())
    }
}
