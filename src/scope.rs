//! Tenant scoping
//!
//! Every read, update and delete on a tenant table passes its conditions
//! through [`scope_conditions`] before they reach the engine.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

pub const OWNER_COLUMN: &str = "owner_id";
pub const PROJECT_COLUMN: &str = "project_id";

/// Authenticated caller context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub owner_id: String,
    pub project_id: String,
}

impl Tenant {
    pub fn new(owner_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            project_id: project_id.into(),
        }
    }
}

/// Per-call switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Skip tenant scoping
    pub is_admin: bool,
    /// Include columns marked hidden in results
    pub show_hidden: bool,
}

impl QueryOptions {
    pub fn user() -> Self {
        Self::default()
    }

    pub fn admin() -> Self {
        Self {
            is_admin: true,
            show_hidden: false,
        }
    }

    pub fn with_hidden(mut self) -> Self {
        self.show_hidden = true;
        self
    }
}

/// Append owner/project equality conditions unless the caller is an admin
pub fn scope_conditions(
    mut conditions: Vec<Condition>,
    tenant: &Tenant,
    is_admin: bool,
) -> Vec<Condition> {
    if is_admin {
        tracing::debug!("admin access, tenant scoping skipped");
        return conditions;
    }

    conditions.push(Condition::eq(OWNER_COLUMN, tenant.owner_id.as_str()));
    conditions.push(Condition::eq(PROJECT_COLUMN, tenant.project_id.as_str()));
    conditions
}
