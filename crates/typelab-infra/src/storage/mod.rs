//! Blob storage backends.

mod local;

pub use local::LocalBlobStorage;
