//! Database connection management and the PostgreSQL repositories.

mod connections;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use sea_orm::DatabaseConnection;

#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresProfileRepository, PostgresUserRepository};
