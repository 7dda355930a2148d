//! Post engine error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Post operation errors.
#[derive(Debug, Error)]
pub enum PostError {
    /// Post not found.
    #[error("post not found: {0}")]
    NotFound(Uuid),

    /// Attachment not found.
    #[error("attachment not found: {0}")]
    AttachmentNotFound(Uuid),

    /// Requester is not the post owner.
    #[error("not authorized to modify this post")]
    Unauthorized,

    /// Caller-supplied data violates a constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Blob backend refused or failed a write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Relational layer failed to persist the unit of work.
    #[error("repository error: {0}")]
    Repository(String),
}

impl PostError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound(id)
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
