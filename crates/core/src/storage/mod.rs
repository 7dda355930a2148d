//! Blob store adapter for attachment payloads.
//!
//! Wraps Apache OpenDAL so the rest of the system only ever sees opaque
//! storage keys, regardless of whether blobs live on S3, Azure, or local disk.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::BlobStore;
