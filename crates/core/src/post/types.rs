//! Post and attachment types.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Post domain model.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user. Immutable after creation.
    pub user_id: Uuid,
    /// Post body text.
    pub body: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Attachment domain model.
///
/// Attachments are immutable once written; replacing one is delete + create,
/// which is why there is no update timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning post.
    pub post_id: Uuid,
    /// Original display name.
    pub name: String,
    /// Opaque blob store key.
    pub storage_key: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// User who uploaded the file.
    pub created_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An uploaded file payload accompanying a post mutation.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Original filename.
    pub name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl NewUpload {
    /// Size of the payload in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    /// Owner of the new post (already authenticated by the caller).
    pub owner_id: Uuid,
    /// Post body text.
    pub body: String,
    /// Files to attach, in display order.
    pub files: Vec<NewUpload>,
}

/// Input for updating a post.
#[derive(Debug, Clone)]
pub struct UpdatePostInput {
    /// Post to update.
    pub post_id: Uuid,
    /// Requesting user; must be the post owner.
    pub owner_id: Uuid,
    /// Replacement body text.
    pub body: String,
    /// Attachment ids to remove. Ids not belonging to this post are ignored.
    pub deleted_attachment_ids: Vec<Uuid>,
    /// Files to append, in display order.
    pub files: Vec<NewUpload>,
}

/// Post row to insert, with its id pre-generated so blob keys can be
/// namespaced before the row exists.
#[derive(Debug, Clone)]
pub struct NewPostRecord {
    /// Post id.
    pub id: Uuid,
    /// Owner id.
    pub user_id: Uuid,
    /// Body text.
    pub body: String,
}

/// Attachment row to insert. The referenced blob has already been written.
#[derive(Debug, Clone)]
pub struct NewAttachmentRecord {
    /// Attachment id.
    pub id: Uuid,
    /// Owning post id.
    pub post_id: Uuid,
    /// Original display name.
    pub name: String,
    /// Blob store key.
    pub storage_key: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Uploading user.
    pub created_by: Uuid,
}

/// A post together with its attachments, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAttachments {
    /// The post.
    pub post: Post,
    /// Attachments in insertion order.
    pub attachments: Vec<Attachment>,
}

/// Result of an atomic update unit.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The updated post.
    pub post: Post,
    /// Surviving attachments in insertion order.
    pub attachments: Vec<Attachment>,
    /// Storage keys of attachment rows removed by the unit. The caller
    /// deletes these blobs only after the unit has committed.
    pub removed_keys: Vec<String>,
}

/// A downloadable attachment payload.
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    /// Original display name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File contents.
    pub data: Bytes,
}
