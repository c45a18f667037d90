//! Row identifiers

use uuid::Uuid;

/// Length of a canonical hyphenated UUID string
pub const ID_LENGTH: usize = 36;

/// New random (v4) identifier in lowercase 8-4-4-4-12 form
pub fn generate_id() -> String {
    Uuid::new_v4().hyphenated().to_string().to_lowercase()
}
