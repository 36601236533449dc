use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Public profile of an author, keyed by the same id as the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
}

impl Profile {
    /// Build a profile, rejecting blank display names.
    pub fn new(id: Uuid, display_name: &str) -> Result<Self, DomainError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::Validation(
                "display name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            display_name: display_name.to_string(),
        })
    }
}
