//! Admin-managed reference tables, not scoped to a tenant

use std::sync::Arc;

use serde_json::Value;

use crate::condition::{Condition, Row, RowSet};
use crate::engine::TableEngine;
use crate::error::Result;
use crate::identity::{generate_id, ID_LENGTH};
use crate::schema::{Column, Schema};
use crate::scope::QueryOptions;

pub const NAME_COLUMN: &str = "name";
pub const CREATOR_COLUMN: &str = "creator_id";

/// Table with `id`, `name` and `creator_id` ahead of its own columns.
///
/// Rows are not tenant-scoped, so only `QueryOptions::show_hidden` affects reads.
#[derive(Debug, Clone)]
pub struct AdminTable<E> {
    engine: E,
    schema: Arc<Schema>,
}

impl<E: TableEngine> AdminTable<E> {
    pub fn new(engine: E, table_name: &str, extra_columns: Vec<Column>) -> Result<Self> {
        let mut columns = vec![
            Column::text("id", ID_LENGTH).primary(),
            Column::text(NAME_COLUMN, 36),
            Column::text(CREATOR_COLUMN, 128),
        ];
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

    /// Insert a row, generating its id when none was given
    pub async fn add(&self, mut values: Row) -> Result<Row> {
        if values.get("id").map_or(true, is_blank) {
            values.insert("id".to_string(), Value::String(generate_id()));
        }

        self.engine.insert(&self.schema, &values).await?;
        Ok(values)
    }

    pub async fn get(
        &self,
        conditions: Vec<Condition>,
        options: QueryOptions,
    ) -> Result<Option<Row>> {
        self.engine
            .select_one(&self.schema, &conditions, options.show_hidden)
            .await
    }

    pub async fn get_all(
        &self,
        conditions: Vec<Condition>,
        options: QueryOptions,
    ) -> Result<RowSet> {
        self.engine
            .select_all(&self.schema, &conditions, options.show_hidden)
            .await
    }

    pub async fn update(&self, values: Row, conditions: Vec<Condition>) -> Result<u64> {
        self.engine.update(&self.schema, &conditions, &values).await
    }

    pub async fn delete(&self, conditions: Vec<Condition>) -> Result<u64> {
        self.engine.delete(&self.schema, &conditions).await
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str() == Some("")
}
