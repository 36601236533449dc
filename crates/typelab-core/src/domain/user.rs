use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// An account that can sign in and publish. Its id doubles as the
/// author id on posts and the key of its profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Always stored normalized, see [`User::normalize_email`].
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Trim and lowercase an address typed at sign-up or sign-in.
    pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
        let email = raw.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
            _ => Err(DomainError::Validation(format!(
                "invalid email address '{}'",
                raw.trim()
            ))),
        }
    }
}
