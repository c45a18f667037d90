//! Table types
//!
//! Each table owns its schema and delegates execution to a [`TableEngine`]:
//! - [`TenantTable`]: rows owned by an owner/project pair, scoped for non-admins
//! - [`AdminTable`]: named reference rows with a creator, unscoped
//! - [`LogTable`]: timestamped append-only entries
//!
//! [`TableEngine`]: crate::engine::TableEngine

pub mod admin;
pub mod log;
pub mod tenant;

pub use admin::AdminTable;
pub use log::LogTable;
pub use tenant::{IdPolicy, TenantTable, Visibility};
