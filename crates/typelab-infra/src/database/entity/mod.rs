//! SeaORM entities, one per table.

pub mod post;
pub mod profile;
pub mod user;
