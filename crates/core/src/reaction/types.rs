//! Reaction types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::ReactionError;

/// Supported reaction vocabulary.
///
/// Closed set by design; adding a variant is a deliberate schema-level
/// change, not a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    /// A like.
    Like,
}

impl ReactionType {
    /// Canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
        }
    }

    /// Parse from the wire representation.
    ///
    /// # Errors
    ///
    /// Returns `ReactionError::UnsupportedReaction` for anything outside
    /// the vocabulary.
    pub fn parse(raw: &str) -> Result<Self, ReactionError> {
        match raw {
            "like" => Ok(Self::Like),
            other => Err(ReactionError::UnsupportedReaction(other.to_string())),
        }
    }
}

/// Kind of entity a reaction attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A post.
    Post,
    /// A comment.
    Comment,
}

impl TargetKind {
    /// Canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }

    /// Parse from the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `ReactionError::UnsupportedTarget` for anything outside
    /// the vocabulary.
    pub fn parse(raw: &str) -> Result<Self, ReactionError> {
        match raw {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            other => Err(ReactionError::UnsupportedTarget(other.to_string())),
        }
    }
}

/// Reaction domain model.
#[derive(Debug, Clone, Serialize)]
pub struct Reaction {
    /// Unique identifier.
    pub id: Uuid,
    /// Reacting user.
    pub user_id: Uuid,
    /// Target entity id.
    pub target_id: Uuid,
    /// Target entity kind.
    pub target_kind: TargetKind,
    /// Reaction type.
    pub reaction_type: ReactionType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Reaction row to insert.
#[derive(Debug, Clone)]
pub struct NewReactionRecord {
    /// Reacting user.
    pub user_id: Uuid,
    /// Target entity id.
    pub target_id: Uuid,
    /// Target entity kind.
    pub target_kind: TargetKind,
    /// Reaction type.
    pub reaction_type: ReactionType,
}

/// Aggregate state of a target after a toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReactionSummary {
    /// Total reactions on the target, observed after the toggle.
    pub num_of_reactions: u64,
    /// Whether the toggling user now has a reaction on the target.
    pub current_user_has_reaction: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_type_roundtrip() {
        let parsed = ReactionType::parse("like").expect("like is supported");
        assert_eq!(parsed, ReactionType::Like);
        assert_eq!(parsed.as_str(), "like");
    }

    #[test]
    fn test_reaction_type_rejects_unknown() {
        let err = ReactionType::parse("dislike").unwrap_err();
        assert!(matches!(err, ReactionError::UnsupportedReaction(_)));

        // Vocabulary matching is exact, not case-folded.
        assert!(ReactionType::parse("Like").is_err());
        assert!(ReactionType::parse("").is_err());
    }

    #[test]
    fn test_target_kind_roundtrip() {
        assert_eq!(
            TargetKind::parse("post").expect("post is supported"),
            TargetKind::Post
        );
        assert_eq!(
            TargetKind::parse("comment").expect("comment is supported"),
            TargetKind::Comment
        );
        assert!(TargetKind::parse("page").is_err());
    }
}
