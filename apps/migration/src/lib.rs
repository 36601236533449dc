//! Schema migrations for the Typelab database.

pub use sea_orm_migration::prelude::*;

mod m20251101_000001_create_users;
mod m20251101_000002_create_profiles;
mod m20251101_000003_create_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_create_users::Migration),
            Box::new(m20251101_000002_create_profiles::Migration),
            Box::new(m20251101_000003_create_posts::Migration),
        ]
    }
}
