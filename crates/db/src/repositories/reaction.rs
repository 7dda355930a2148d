//! Reaction repository for database operations.
//!
//! Implements the reaction engine's persistence trait using `SeaORM`. The
//! reactions table carries a unique index on (user_id, target_id,
//! target_kind); a violated insert is reported as `AlreadyReacted` so the
//! engine can treat it as a concurrency signal.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::reactions;
use murmur_core::reaction::{
    NewReactionRecord, Reaction, ReactionError, ReactionRepository as ReactionRepoTrait,
    ReactionType, TargetKind,
};

/// Reaction repository implementation.
#[derive(Debug, Clone)]
pub struct ReactionRepository {
    db: DatabaseConnection,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ReactionRepoTrait for ReactionRepository {
    async fn find(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> Result<Option<Reaction>, ReactionError> {
        let model = reactions::Entity::find()
            .filter(reactions::Column::UserId.eq(user_id))
            .filter(reactions::Column::TargetId.eq(target_id))
            .filter(reactions::Column::TargetKind.eq(target_kind.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| ReactionError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn insert(&self, record: NewReactionRecord) -> Result<Reaction, ReactionError> {
        let active_model = reactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(record.user_id),
            target_id: Set(record.target_id),
            target_kind: Set(record.target_kind.as_str().to_string()),
            reaction_type: Set(record.reaction_type.as_str().to_string()),
            created_at: Set(Utc::now().into()),
        };

        match active_model.insert(&self.db).await {
            Ok(model) => to_domain(model),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(ReactionError::AlreadyReacted),
                _ => Err(ReactionError::repository(e.to_string())),
            },
        }
    }

    async fn delete(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> Result<(), ReactionError> {
        reactions::Entity::delete_many()
            .filter(reactions::Column::UserId.eq(user_id))
            .filter(reactions::Column::TargetId.eq(target_id))
            .filter(reactions::Column::TargetKind.eq(target_kind.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| ReactionError::repository(e.to_string()))?;

        Ok(())
    }

    async fn count(
        &self,
        target_id: Uuid,
        target_kind: TargetKind,
    ) -> Result<u64, ReactionError> {
        reactions::Entity::find()
            .filter(reactions::Column::TargetId.eq(target_id))
            .filter(reactions::Column::TargetKind.eq(target_kind.as_str()))
            .count(&self.db)
            .await
            .map_err(|e| ReactionError::repository(e.to_string()))
    }
}

/// Convert database model to domain model.
///
/// The stored vocabulary columns are CHECK-constrained, so a parse failure
/// here means the schema and code disagree.
fn to_domain(model: reactions::Model) -> Result<Reaction, ReactionError> {
    Ok(Reaction {
        id: model.id,
        user_id: model.user_id,
        target_id: model.target_id,
        target_kind: TargetKind::parse(&model.target_kind)?,
        reaction_type: ReactionType::parse(&model.reaction_type)?,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    })
}
