//! In-memory stores - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

mod post;
mod profile;
mod user;

pub use post::InMemoryPostRepository;
pub use profile::InMemoryProfileRepository;
pub use user::InMemoryUserRepository;
