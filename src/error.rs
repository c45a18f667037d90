//! Error type shared by all tables and engines

use thiserror::Error;

use crate::schema::ColumnType;

/// Failure of a table operation.
///
/// Validation variants are raised before anything reaches the database.
/// Rows hidden by tenant scoping are reported as not found, never as an error.
#[derive(Error, Debug)]
pub enum TableError {
    /// Table or column name that is not a plain SQL identifier
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),
    /// Column declared twice in one schema
    #[error("duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },
    /// Row lacks a value the schema requires
    #[error("missing required field '{0}'")]
    MissingField(String),
    /// Row or condition names a column the table does not have
    #[error("unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },
    /// Text value longer than the column allows
    #[error("value for '{column}' is {actual} characters long, max is {max_length}")]
    ValueTooLong {
        column: String,
        max_length: usize,
        actual: usize,
    },
    /// Value of the wrong JSON type for the column
    #[error("value for '{column}' is not of type {expected}")]
    TypeMismatch { column: String, expected: ColumnType },
    /// Visibility marker outside the known set
    #[error("invalid visibility '{0}'")]
    InvalidVisibility(String),
    /// Update that tries to change a system-controlled column
    #[error("column '{0}' is system-controlled and cannot be updated")]
    ProtectedColumn(String),
    /// Update without any values
    #[error("update contains no values")]
    EmptyUpdate,
    /// Error reported by the database driver
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Failure preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    /// True for errors detected before delegating to the database
    pub fn is_validation(&self) -> bool {
        !matches!(self, TableError::Database(_) | TableError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
