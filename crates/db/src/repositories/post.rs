//! Post repository for database operations.
//!
//! Implements the post engine's persistence trait using `SeaORM`. Mutating
//! methods run inside a database transaction so the post row, attachment
//! rows, and reaction rows move together.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{post_attachments, posts, reactions};
use murmur_core::post::{
    Attachment, NewAttachmentRecord, NewPostRecord, Post, PostError,
    PostRepository as PostRepoTrait, PostWithAttachments, UpdateOutcome,
};
use murmur_core::reaction::TargetKind;

/// Post repository implementation.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_attachments(
        txn: &DatabaseTransaction,
        records: Vec<NewAttachmentRecord>,
    ) -> Result<Vec<Attachment>, PostError> {
        let now = Utc::now();
        let mut inserted = Vec::with_capacity(records.len());

        for record in records {
            let active_model = post_attachments::ActiveModel {
                id: Set(record.id),
                post_id: Set(record.post_id),
                name: Set(record.name),
                storage_key: Set(record.storage_key),
                mime_type: Set(record.mime_type),
                size_bytes: Set(record.size_bytes),
                created_by: Set(record.created_by),
                created_at: Set(now.into()),
            };

            let model = active_model
                .insert(txn)
                .await
                .map_err(|e| PostError::repository(e.to_string()))?;
            inserted.push(attachment_to_domain(model));
        }

        Ok(inserted)
    }
}

impl PostRepoTrait for PostRepository {
    async fn create(
        &self,
        post: NewPostRecord,
        attachments: Vec<NewAttachmentRecord>,
    ) -> Result<PostWithAttachments, PostError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        let now = Utc::now();
        let post_model = posts::ActiveModel {
            id: Set(post.id),
            user_id: Set(post.user_id),
            body: Set(post.body),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let post_model = post_model
            .insert(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        let inserted = Self::insert_attachments(&txn, attachments).await?;

        txn.commit()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(PostWithAttachments {
            post: post_to_domain(post_model),
            attachments: inserted,
        })
    }

    async fn update(
        &self,
        post_id: Uuid,
        body: String,
        deleted_attachment_ids: &[Uuid],
        new_attachments: Vec<NewAttachmentRecord>,
    ) -> Result<UpdateOutcome, PostError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        let post_model = posts::Entity::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?
            .ok_or_else(|| PostError::not_found(post_id))?;

        let mut active: posts::ActiveModel = post_model.into();
        active.body = Set(body);
        active.updated_at = Set(Utc::now().into());
        let post_model = active
            .update(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        // Deletions before additions. The id filter is scoped to this post,
        // so ids belonging to other posts fall through harmlessly.
        let mut removed_keys = Vec::new();
        if !deleted_attachment_ids.is_empty() {
            let doomed = post_attachments::Entity::find()
                .filter(post_attachments::Column::PostId.eq(post_id))
                .filter(post_attachments::Column::Id.is_in(deleted_attachment_ids.to_vec()))
                .all(&txn)
                .await
                .map_err(|e| PostError::repository(e.to_string()))?;

            if !doomed.is_empty() {
                let doomed_ids: Vec<Uuid> = doomed.iter().map(|a| a.id).collect();
                post_attachments::Entity::delete_many()
                    .filter(post_attachments::Column::PostId.eq(post_id))
                    .filter(post_attachments::Column::Id.is_in(doomed_ids))
                    .exec(&txn)
                    .await
                    .map_err(|e| PostError::repository(e.to_string()))?;

                removed_keys = doomed.into_iter().map(|a| a.storage_key).collect();
            }
        }

        let kept = post_attachments::Entity::find()
            .filter(post_attachments::Column::PostId.eq(post_id))
            .order_by_asc(post_attachments::Column::CreatedAt)
            .order_by_asc(post_attachments::Column::Id)
            .all(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        // Appended after the kept rows so the aggregate reflects input order;
        // a shared insertion timestamp makes re-querying unreliable for this.
        let inserted = Self::insert_attachments(&txn, new_attachments).await?;

        txn.commit()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        let mut surviving: Vec<Attachment> =
            kept.into_iter().map(attachment_to_domain).collect();
        surviving.extend(inserted);

        Ok(UpdateOutcome {
            post: post_to_domain(post_model),
            attachments: surviving,
            removed_keys,
        })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, PostError> {
        let model = posts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(model.map(post_to_domain))
    }

    async fn find_attachment(&self, id: Uuid) -> Result<Option<Attachment>, PostError> {
        let model = post_attachments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(model.map(attachment_to_domain))
    }

    async fn list_attachments(&self, post_id: Uuid) -> Result<Vec<Attachment>, PostError> {
        let models = post_attachments::Entity::find()
            .filter(post_attachments::Column::PostId.eq(post_id))
            .order_by_asc(post_attachments::Column::CreatedAt)
            .order_by_asc(post_attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(models.into_iter().map(attachment_to_domain).collect())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<Vec<String>, PostError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        let attachments = post_attachments::Entity::find()
            .filter(post_attachments::Column::PostId.eq(post_id))
            .all(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;
        let removed_keys: Vec<String> =
            attachments.into_iter().map(|a| a.storage_key).collect();

        // Reactions reference the post polymorphically, so the post's FK
        // cascade cannot reach them.
        reactions::Entity::delete_many()
            .filter(reactions::Column::TargetId.eq(post_id))
            .filter(reactions::Column::TargetKind.eq(TargetKind::Post.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        post_attachments::Entity::delete_many()
            .filter(post_attachments::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        posts::Entity::delete_by_id(post_id)
            .exec(&txn)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(removed_keys)
    }
}

/// Convert database model to domain model.
fn post_to_domain(model: posts::Model) -> Post {
    Post {
        id: model.id,
        user_id: model.user_id,
        body: model.body,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    }
}

/// Convert database model to domain model.
fn attachment_to_domain(model: post_attachments::Model) -> Attachment {
    Attachment {
        id: model.id,
        post_id: model.post_id,
        name: model.name,
        storage_key: model.storage_key,
        mime_type: model.mime_type,
        size_bytes: model.size_bytes,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    }
}
