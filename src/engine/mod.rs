//! Relational table driver
//!
//! Tables never talk SQL themselves. They hold an engine and hand it their
//! schema on every call. `SqliteEngine` is the production implementation;
//! anything else (a recording fake in tests, another backend) only has to
//! implement [`TableEngine`].

use std::future::Future;

use crate::condition::{Condition, Row, RowSet};
use crate::error::Result;
use crate::schema::Schema;

pub mod sqlite;

pub use sqlite::SqliteEngine;

/// Insert/select/update/delete-by-condition over a schema
///
/// Implementations that generate SQL must check rows and conditions against
/// the schema (`Schema::validate_*`) before building a statement.
pub trait TableEngine: Send + Sync {
    /// Create the table if it does not exist yet
    fn create_table(&self, schema: &Schema) -> impl Future<Output = Result<()>> + Send;

    fn insert(&self, schema: &Schema, row: &Row) -> impl Future<Output = Result<()>> + Send;

    /// First matching row, if any
    fn select_one(
        &self,
        schema: &Schema,
        conditions: &[Condition],
        show_hidden: bool,
    ) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// All matching rows in insertion order
    fn select_all(
        &self,
        schema: &Schema,
        conditions: &[Condition],
        show_hidden: bool,
    ) -> impl Future<Output = Result<RowSet>> + Send;

    /// Returns the number of updated rows
    fn update(
        &self,
        schema: &Schema,
        conditions: &[Condition],
        values: &Row,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Returns the number of deleted rows
    fn delete(
        &self,
        schema: &Schema,
        conditions: &[Condition],
    ) -> impl Future<Output = Result<u64>> + Send;
}
