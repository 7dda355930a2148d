//! Reaction engine error types.

use thiserror::Error;

/// Reaction operation errors.
#[derive(Debug, Error)]
pub enum ReactionError {
    /// Reaction type outside the supported vocabulary.
    #[error("unsupported reaction type: {0}")]
    UnsupportedReaction(String),

    /// Target kind outside the supported vocabulary.
    #[error("unsupported target kind: {0}")]
    UnsupportedTarget(String),

    /// Insert collided with an existing reaction row for the same
    /// (user, target) pair. The service treats this as a signal, not a
    /// failure.
    #[error("reaction already exists for this user and target")]
    AlreadyReacted,

    /// Relational layer failure.
    #[error("repository error: {0}")]
    Repository(String),
}

impl ReactionError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
