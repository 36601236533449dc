//! # Typelab Infrastructure
//!
//! Concrete implementations of the ports defined in `typelab-core`.
//! This crate contains the database, in-memory and file storage backends.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory stores only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;
pub mod memory;
pub mod storage;

#[cfg(feature = "auth")]
pub mod auth;

pub use database::DatabaseConfig;
pub use memory::{InMemoryPostRepository, InMemoryProfileRepository, InMemoryUserRepository};
pub use storage::LocalBlobStorage;

#[cfg(feature = "postgres")]
pub use database::DatabaseConnection;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
