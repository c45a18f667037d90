//! Append-only log tables

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::condition::{Condition, Row, RowSet};
use crate::engine::TableEngine;
use crate::error::Result;
use crate::schema::{Column, Schema};
use crate::scope::QueryOptions;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Table keyed by nothing but insertion order, led by a `timestamp` column
#[derive(Debug, Clone)]
pub struct LogTable<E> {
    engine: E,
    schema: Arc<Schema>,
}

impl<E: TableEngine> LogTable<E> {
    pub fn new(engine: E, table_name: &str, extra_columns: Vec<Column>) -> Result<Self> {
        let mut columns = vec![Column::text(TIMESTAMP_COLUMN, 128)];
        columns.extend(extra_columns);

        Ok(Self {
            engine,
            schema: Arc::new(Schema::new(table_name, columns)?),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub async fn init(&self) -> Result<()> {
        self.engine.create_table(&self.schema).await
    }

    /// Append an entry, stamped with the current UTC time unless it has one
    pub async fn add(&self, mut values: Row) -> Result<Row> {
        if values.get(TIMESTAMP_COLUMN).map_or(true, Value::is_null) {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            values.insert(TIMESTAMP_COLUMN.to_string(), Value::String(now));
        }

        self.engine.insert(&self.schema, &values).await?;
        Ok(values)
    }

    /// Entries in the order they were written; only `show_hidden` applies
    pub async fn get_all(
        &self,
        conditions: Vec<Condition>,
        options: QueryOptions,
    ) -> Result<RowSet> {
        self.engine
            .select_all(&self.schema, &conditions, options.show_hidden)
            .await
    }
}
