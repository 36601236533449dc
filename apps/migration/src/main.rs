//! Migration CLI for the Typelab database.
//!
//! Reads `DATABASE_URL` (from `.env` when present) and applies or reverts
//! migrations, e.g. `migration up` or `migration fresh`.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,sea_orm_migration=info")
        .init();

    cli::run_cli(migration::Migrator).await;
}
