//! Domain-level error types.

use thiserror::Error;
use uuid::Uuid;

/// Failures of domain rules, independent of storage.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The caller is signed in but does not own the entity.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Failures reported by repositories and decoders of stored rows.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A stored row could not be turned into a domain value.
    #[error("Stored record is malformed: {0}")]
    Corrupt(String),
}
