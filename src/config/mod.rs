//! Configuration for the table layer
//!
//! Only the database location and pool size are configurable. Values come from
//! environment variables so the same build runs locally and in containers.

use serde::{Deserialize, Serialize};

/// Path value selecting a private in-memory SQLite database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file (e.g., "data/tables.db") or ":memory:"
    pub path: String,
    /// Upper bound for pooled connections
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Configuration for a throwaway in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY_PATH
    }
}

impl Default for DatabaseConfig {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            path: std::env::var("TENANT_TABLES_DB_PATH")
                .unwrap_or_else(|_| "data/tables.db".to_string()),
            max_connections: std::env::var("TENANT_TABLES_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        }
    }
}
