//! SQLite table engine
//!
//! Generates SQL from a validated [`Schema`] and binds every value as a
//! parameter. Identifiers in the generated statements only ever come from the
//! schema, and condition/update columns are checked against it first. They are
//! always double-quoted so keywords such as `order` work as column names.

use std::path::Path;
use std::str::FromStr;

use serde_json::{json, Value};
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row as _;

use crate::condition::{Condition, Row, RowSet};
use crate::config::DatabaseConfig;
use crate::engine::TableEngine;
use crate::error::Result;
use crate::schema::{Column, ColumnType, Schema};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Table engine over a sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteEngine {
    pool: SqlitePool,
}

impl SqliteEngine {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.is_in_memory() {
            return Self::in_memory().await;
        }

        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!("🗄️ Opening table database: {}", config.path);

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the pool
    /// holds exactly one connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::debug!("Opened in-memory table database");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl TableEngine for SqliteEngine {
    async fn create_table(&self, schema: &Schema) -> Result<()> {
        let sql = create_table_sql(schema);
        tracing::debug!("📝 SQL Query: {}", sql);

        sqlx::query(&sql).execute(&self.pool).await?;

        tracing::info!("✅ Table ready: {}", schema.table_name());
        Ok(())
    }

    async fn insert(&self, schema: &Schema, row: &Row) -> Result<()> {
        schema.validate_insert(row)?;

        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        let quoted: Vec<String> = names.iter().map(|name| quote(name)).collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(schema.table_name()),
            quoted.join(", "),
            placeholders
        );
        tracing::debug!("📝 SQL Query: {}", sql);

        let mut query = sqlx::query(&sql);
        for name in &names {
            query = bind_value(query, row.get(*name).unwrap_or(&Value::Null));
        }
        query.execute(&self.pool).await?;

        Ok(())
    }

    async fn select_one(
        &self,
        schema: &Schema,
        conditions: &[Condition],
        show_hidden: bool,
    ) -> Result<Option<Row>> {
        schema.validate_conditions(conditions)?;

        let columns: Vec<&Column> = schema.visible_columns(show_hidden).collect();
        let sql = format!("{} LIMIT 1", select_sql(schema, &columns, conditions));
        tracing::debug!("📝 SQL Query: {}", sql);

        let row = bind_conditions(sqlx::query(&sql), conditions)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_row(&row, &columns)).transpose()
    }

    async fn select_all(
        &self,
        schema: &Schema,
        conditions: &[Condition],
        show_hidden: bool,
    ) -> Result<RowSet> {
        schema.validate_conditions(conditions)?;

        let columns: Vec<&Column> = schema.visible_columns(show_hidden).collect();
        let sql = select_sql(schema, &columns, conditions);
        tracing::debug!("📝 SQL Query: {}", sql);

        let rows = bind_conditions(sqlx::query(&sql), conditions)
            .fetch_all(&self.pool)
            .await?;

        let mut result = RowSet::new(columns.iter().map(|c| c.name.clone()).collect());
        for row in &rows {
            result.rows.push(decode_row(row, &columns)?);
        }

        tracing::debug!("📊 {} rows read from {}", result.len(), schema.table_name());
        Ok(result)
    }

    async fn update(&self, schema: &Schema, conditions: &[Condition], values: &Row) -> Result<u64> {
        schema.validate_update(values)?;
        schema.validate_conditions(conditions)?;

        let assignments: Vec<String> = values
            .keys()
            .map(|name| format!("{} = ?", quote(name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}{}",
            quote(schema.table_name()),
            assignments.join(", "),
            where_clause(conditions)
        );
        tracing::debug!("📝 SQL Query: {}", sql);

        let mut query = sqlx::query(&sql);
        for value in values.values() {
            query = bind_value(query, value);
        }
        let result = bind_conditions(query, conditions).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, schema: &Schema, conditions: &[Condition]) -> Result<u64> {
        schema.validate_conditions(conditions)?;

        let sql = format!(
            "DELETE FROM {}{}",
            quote(schema.table_name()),
            where_clause(conditions)
        );
        tracing::debug!("📝 SQL Query: {}", sql);

        let result = bind_conditions(sqlx::query(&sql), conditions)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn create_table_sql(schema: &Schema) -> String {
    let column_defs: Vec<String> = schema
        .columns()
        .iter()
        .map(|c| {
            let mut def = format!("{} {} NOT NULL", quote(&c.name), c.column_type.sql_type());
            if c.is_primary {
                def.push_str(" PRIMARY KEY");
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(schema.table_name()),
        column_defs.join(", ")
    )
}

fn select_sql(schema: &Schema, columns: &[&Column], conditions: &[Condition]) -> String {
    let names: Vec<String> = columns.iter().map(|c| quote(&c.name)).collect();
    // A table with every column hidden still needs a valid select list
    let select_list = if names.is_empty() {
        "rowid".to_string()
    } else {
        names.join(", ")
    };

    format!(
        "SELECT {} FROM {}{} ORDER BY rowid",
        select_list,
        quote(schema.table_name()),
        where_clause(conditions)
    )
}

/// Identifiers passed `is_identifier`, so they never contain a quote
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

fn where_clause(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return String::new();
    }

    let predicates: Vec<String> = conditions
        .iter()
        .map(|c| {
            if c.value.is_null() {
                format!("{} IS NULL", quote(&c.column))
            } else {
                format!("{} = ?", quote(&c.column))
            }
        })
        .collect();

    format!(" WHERE {}", predicates.join(" AND "))
}

fn bind_conditions<'q>(mut query: SqliteQuery<'q>, conditions: &[Condition]) -> SqliteQuery<'q> {
    for condition in conditions.iter().filter(|c| !c.value.is_null()) {
        query = bind_value(query, &condition.value);
    }
    query
}

/// Bind a JSON value using the closest SQLite type
fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::String(s) => query.bind(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::Bool(b) => query.bind(*b),
        Value::Null => query.bind(None::<String>),
        _ => query.bind(value.to_string()),
    }
}

fn decode_row(row: &SqliteRow, columns: &[&Column]) -> Result<Row> {
    let mut record = Row::new();
    for column in columns {
        let name = column.name.as_str();
        let value = match column.column_type {
            ColumnType::Text => row
                .try_get::<Option<String>, _>(name)?
                .map_or(Value::Null, Value::String),
            ColumnType::Integer => row
                .try_get::<Option<i64>, _>(name)?
                .map_or(Value::Null, |i| json!(i)),
        };
        record.insert(name.to_string(), value);
    }
    Ok(record)
}
