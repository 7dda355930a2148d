//! Reaction toggle engine implementation.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::error::ReactionError;
use super::types::{NewReactionRecord, Reaction, ReactionSummary, ReactionType, TargetKind};

/// Repository trait for reaction persistence.
///
/// Implementations back `insert` with a uniqueness guarantee on
/// (user, target id, target kind): a second insert for the same triple must
/// fail with `ReactionError::AlreadyReacted` rather than create a duplicate
/// row. This trait is implemented by the db crate.
pub trait ReactionRepository: Send + Sync {
    /// Find the caller's reaction on a target, if any.
    fn find(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> impl std::future::Future<Output = Result<Option<Reaction>, ReactionError>> + Send;

    /// Insert a reaction row. Fails with `AlreadyReacted` when the
    /// uniqueness constraint is violated.
    fn insert(
        &self,
        record: NewReactionRecord,
    ) -> impl std::future::Future<Output = Result<Reaction, ReactionError>> + Send;

    /// Delete the caller's reaction on a target. Deleting a missing row is
    /// not an error.
    fn delete(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> impl std::future::Future<Output = Result<(), ReactionError>> + Send;

    /// Count all reactions on a target.
    fn count(
        &self,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> impl std::future::Future<Output = Result<u64, ReactionError>> + Send;
}

/// Reaction toggle engine.
///
/// A toggle flips the caller's reaction on a target: absent becomes present,
/// present becomes absent. The operation converges under concurrent toggles
/// by treating an insert conflict as proof the reaction already exists and
/// flipping to the removal branch.
pub struct ReactionService<R: ReactionRepository> {
    repo: Arc<R>,
}

impl<R: ReactionRepository> ReactionService<R> {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Toggle the caller's reaction on a target.
    ///
    /// The raw reaction type is validated against the vocabulary before any
    /// persistence work happens. Returns the target's aggregate state as
    /// observed after the toggle.
    ///
    /// # Errors
    ///
    /// Returns `ReactionError::UnsupportedReaction` for an unknown type and
    /// `ReactionError::Repository` on persistence failure.
    pub async fn toggle(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        raw_type: &str,
    ) -> Result<ReactionSummary, ReactionError> {
        let reaction_type = ReactionType::parse(raw_type)?;

        let existing = self.repo.find(user_id, target_id, target_kind).await?;

        let has_reaction = if let Some(reaction) = existing {
            self.remove(user_id, target_id, target_kind, reaction.id)
                .await?
        } else {
            self.add(user_id, target_id, target_kind, reaction_type)
                .await?
        };

        let num_of_reactions = self.repo.count(target_id, target_kind).await?;

        Ok(ReactionSummary {
            num_of_reactions,
            current_user_has_reaction: has_reaction,
        })
    }

    async fn add(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        reaction_type: ReactionType,
    ) -> Result<bool, ReactionError> {
        let record = NewReactionRecord {
            user_id,
            target_id,
            target_kind,
            reaction_type,
        };

        match self.repo.insert(record).await {
            Ok(_) => Ok(true),
            Err(ReactionError::AlreadyReacted) => {
                // Lost a race: a concurrent toggle inserted first. The
                // reaction exists, so this call's intent flips to removal.
                debug!(%user_id, %target_id, "insert conflict, flipping to remove");
                self.repo.delete(user_id, target_id, target_kind).await?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn remove(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
        reaction_id: Uuid,
    ) -> Result<bool, ReactionError> {
        debug!(%user_id, %target_id, %reaction_id, "removing reaction");
        self.repo.delete(user_id, target_id, target_kind).await?;
        Ok(false)
    }
}
