//! # Typelab Core
//!
//! The domain layer of the Typelab blog.
//! Posts, profiles and users, the ports every store must implement, and the
//! garden: day-bucketed tiles whose growth stage follows the number of posts
//! published on that day.

pub mod authors;
pub mod domain;
pub mod error;
pub mod feed;
pub mod garden;
pub mod interaction;
pub mod kst;
pub mod ports;

pub use error::{DomainError, RepoError};
