//! Tenant Tables: multi-tenant SQL tables with UUID primary keys
//!
//! Thin table types over a generic relational driver. Tenant tables stamp new
//! rows with the caller's owner/project and restrict every read, update and
//! delete to that scope unless the caller is an administrator.

// Database location and pool configuration
pub mod config;

// Structured error for every table operation
pub mod error;

// Rows, conditions and multi-row results
pub mod condition;

// Immutable column schemas and row validation
pub mod schema;

// Random row identifiers
pub mod identity;

// Owner/project condition injection
pub mod scope;

// Relational table driver trait and the SQLite implementation
pub mod engine;

// Tenant, admin and log table types
pub mod tables;

// Re-export commonly used types for external consumers
pub use condition::{Condition, Row, RowSet};
pub use config::DatabaseConfig;
pub use engine::{SqliteEngine, TableEngine};
pub use error::{Result, TableError};
pub use identity::generate_id;
pub use schema::{Column, ColumnType, Schema};
pub use scope::{scope_conditions, QueryOptions, Tenant};
pub use tables::{AdminTable, IdPolicy, LogTable, TenantTable, Visibility};
