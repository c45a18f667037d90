//! Tenant-scoped tables
//!
//! Rows carry `id`, `project_id`, `owner_id` and `visibility` ahead of the
//! table's own columns. Inserts are stamped with the caller's owner/project;
//! reads, updates and deletes by non-admins only ever see those rows.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{Condition, Row, RowSet};
use crate::engine::TableEngine;
use crate::error::{Result, TableError};
use crate::identity::{generate_id, ID_LENGTH};
use crate::schema::{Column, Schema};
use crate::scope::{scope_conditions, QueryOptions, Tenant, OWNER_COLUMN, PROJECT_COLUMN};

pub const ID_COLUMN: &str = "id";
pub const VISIBILITY_COLUMN: &str = "visibility";

const TENANT_ID_LENGTH: usize = 128;
const VISIBILITY_LENGTH: usize = 10;

/// Who besides the owner may see a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Shared,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Shared => "shared",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "private" => Ok(Visibility::Private),
            "shared" => Ok(Visibility::Shared),
            "public" => Ok(Visibility::Public),
            other => Err(TableError::InvalidVisibility(other.to_string())),
        }
    }
}

/// How `add` treats a caller-supplied `id`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// Always replace it with a fresh id
    #[default]
    Generate,
    /// Keep it, generating one only when absent
    KeepSupplied,
}

/// Table whose rows belong to an owner within a project
#[derive(Debug, Clone)]
pub struct TenantTable<E> {
    engine: E,
    schema: Arc<Schema>,
    id_policy: IdPolicy,
}

impl<E: TableEngine> TenantTable<E> {
    /// Build the table definition; `extra_columns` follow the tenant columns
    pub fn new(engine: E, table_name: &str, extra_columns: Vec<Column>) -> Result<Self> {
        let mut columns = vec![
            Column::text(ID_COLUMN, ID_LENGTH).primary(),
            Column::text(PROJECT_COLUMN, TENANT_ID_LENGTH),
            Column::text(OWNER_COLUMN, TENANT_ID_LENGTH),
            Column::text(VISIBILITY_COLUMN, VISIBILITY_LENGTH),
        ];
        columns.extend(extra_columns);

        Ok(Self {
            engine,
            schema: Arc::new(Schema::new(table_name, columns)?),
            id_policy: IdPolicy::default(),
        })
    }

    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub async fn init(&self) -> Result<()> {
        self.engine.create_table(&self.schema).await
    }

    /// Insert a row owned by `tenant` and return it as stored
    pub async fn add(&self, mut values: Row, tenant: &Tenant) -> Result<Row> {
        if tenant.owner_id.is_empty() {
            return Err(TableError::MissingField(OWNER_COLUMN.to_string()));
        }
        if tenant.project_id.is_empty() {
            return Err(TableError::MissingField(PROJECT_COLUMN.to_string()));
        }

        let keep_id = self.id_policy == IdPolicy::KeepSupplied
            && values
                .get(ID_COLUMN)
                .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
        if !keep_id {
            values.insert(ID_COLUMN.to_string(), Value::String(generate_id()));
        }

        // Ownership is system-controlled, whatever the caller sent
        if let Some(previous) = values.get(OWNER_COLUMN).and_then(Value::as_str) {
            if previous != tenant.owner_id {
                tracing::warn!(
                    "⚠️ Overriding caller-supplied owner '{}' on {}",
                    previous,
                    self.schema.table_name()
                );
            }
        }
        values.insert(OWNER_COLUMN.to_string(), Value::from(tenant.owner_id.as_str()));
        values.insert(PROJECT_COLUMN.to_string(), Value::from(tenant.project_id.as_str()));

        let visibility = match values.get(VISIBILITY_COLUMN) {
            None | Some(Value::Null) => Visibility::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => return Err(TableError::InvalidVisibility(other.to_string())),
        };
        values.insert(VISIBILITY_COLUMN.to_string(), Value::from(visibility.as_str()));

        self.engine.insert(&self.schema, &values).await?;

        tracing::debug!(
            "Added row to {} for owner {} in project {}",
            self.schema.table_name(),
            tenant.owner_id,
            tenant.project_id
        );
        Ok(values)
    }

    /// First matching row visible to the caller
    pub async fn get(
        &self,
        conditions: Vec<Condition>,
        tenant: &Tenant,
        options: QueryOptions,
    ) -> Result<Option<Row>> {
        let conditions = scope_conditions(conditions, tenant, options.is_admin);
        self.engine
            .select_one(&self.schema, &conditions, options.show_hidden)
            .await
    }

    /// All matching rows visible to the caller
    pub async fn get_all(
        &self,
        conditions: Vec<Condition>,
        tenant: &Tenant,
        options: QueryOptions,
    ) -> Result<RowSet> {
        let conditions = scope_conditions(conditions, tenant, options.is_admin);
        self.engine
            .select_all(&self.schema, &conditions, options.show_hidden)
            .await
    }

    /// Returns the number of updated rows.
    ///
    /// The id never changes; owner and project only change for admins.
    pub async fn update(
        &self,
        values: Row,
        conditions: Vec<Condition>,
        tenant: &Tenant,
        options: QueryOptions,
    ) -> Result<u64> {
        if let Some(visibility) = values.get(VISIBILITY_COLUMN).and_then(Value::as_str) {
            visibility.parse::<Visibility>()?;
        }

        for name in values.keys() {
            let protected = name == ID_COLUMN
                || (!options.is_admin && (name == OWNER_COLUMN || name == PROJECT_COLUMN));
            if protected {
                tracing::warn!(
                    "⚠️ Rejected update of '{}' on {}",
                    name,
                    self.schema.table_name()
                );
                return Err(TableError::ProtectedColumn(name.clone()));
            }
        }

        let conditions = scope_conditions(conditions, tenant, options.is_admin);
        self.engine.update(&self.schema, &conditions, &values).await
    }

    /// Returns the number of deleted rows
    pub async fn delete(
        &self,
        conditions: Vec<Condition>,
        tenant: &Tenant,
        options: QueryOptions,
    ) -> Result<u64> {
        let conditions = scope_conditions(conditions, tenant, options.is_admin);
        self.engine.delete(&self.schema, &conditions).await
    }
}
