//! Domain entities - the core business objects.

mod post;
mod profile;
mod user;

pub use post::{Category, NewPost, Post, PostFilter, PostUpdate};
pub use profile::Profile;
pub use user::User;
