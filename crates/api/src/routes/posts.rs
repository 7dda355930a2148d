//! Post management routes.
//!
//! Post mutations arrive as multipart forms: a `body` text field, repeated
//! `files` fields carrying uploads, and (on update) repeated
//! `deleted_attachment_ids` fields naming attachments to remove.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use murmur_core::post::{
    CreatePostInput, NewUpload, PostError, PostService, PostWithAttachments, UpdatePostInput,
};
use murmur_core::reaction::{ReactionError, ReactionService, TargetKind};
use murmur_core::storage::StorageError;
use murmur_db::repositories::{PostRepository, ReactionRepository};

/// Upper bound on a whole multipart request body.
const MAX_REQUEST_BODY: usize = 64 * 1024 * 1024;

/// Creates the post routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{post_id}", get(get_post))
        .route("/posts/{post_id}", put(update_post))
        .route("/posts/{post_id}", delete(delete_post))
        .route("/posts/{post_id}/reactions", post(toggle_reaction))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a single attachment.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: Uuid,
    /// Original filename.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// Uploading user ID.
    pub created_by: Uuid,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

/// Response for a post with its attachments.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: Uuid,
    /// Owning user ID.
    pub user_id: Uuid,
    /// Post body text.
    pub body: String,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Updated at timestamp (ISO 8601).
    pub updated_at: String,
    /// Attachments in display order.
    pub attachments: Vec<AttachmentResponse>,
}

/// Request body for toggling a reaction.
#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    /// Reaction type to toggle.
    pub reaction: String,
}

/// Response for a reaction toggle.
#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    /// Total reactions on the post after the toggle.
    pub num_of_reactions: u64,
    /// Whether the caller now has a reaction on the post.
    pub current_user_has_reaction: bool,
}

/// Parsed multipart form for a post mutation.
#[derive(Debug, Default)]
struct PostForm {
    body: String,
    deleted_attachment_ids: Vec<Uuid>,
    files: Vec<NewUpload>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn post_service(state: &AppState) -> PostService<PostRepository> {
    let repo = PostRepository::new((*state.db).clone());
    PostService::new(state.storage.clone(), Arc::new(repo))
}

/// Parse one `deleted_attachment_ids` field value.
fn parse_deleted_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid attachment id: {raw}"))
}

/// Collect the post mutation form out of a multipart body.
async fn collect_post_form(mut multipart: Multipart) -> Result<PostForm, Response> {
    let mut form = PostForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "error": "invalid_multipart",
                        "message": e.to_string()
                    })),
                )
                    .into_response());
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "body" => {
                form.body = field.text().await.map_err(multipart_field_error)?;
            }
            "deleted_attachment_ids" | "deleted_attachment_ids[]" => {
                let raw = field.text().await.map_err(multipart_field_error)?;
                let id = parse_deleted_id(&raw).map_err(|message| {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(json!({
                            "error": "invalid_attachment_id",
                            "message": message
                        })),
                    )
                        .into_response()
                })?;
                form.deleted_attachment_ids.push(id);
            }
            "files" | "files[]" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_field_error)?;

                form.files.push(NewUpload {
                    name: file_name,
                    content_type,
                    data,
                });
            }
            _ => {
                // Unknown fields are skipped, not rejected.
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

fn multipart_field_error(e: axum::extract::multipart::MultipartError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "error": "invalid_multipart",
            "message": e.to_string()
        })),
    )
        .into_response()
}

/// Map a post engine error onto an HTTP response.
fn post_error_response(e: &PostError) -> Response {
    match e {
        PostError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "post_not_found",
                "message": "Post not found"
            })),
        )
            .into_response(),
        PostError::AttachmentNotFound(_) | PostError::Storage(StorageError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "attachment_not_found",
                "message": "Attachment not found"
            })),
        )
            .into_response(),
        PostError::Unauthorized => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "You do not own this post"
            })),
        )
            .into_response(),
        PostError::Validation(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "validation_failed",
                "message": message
            })),
        )
            .into_response(),
        PostError::Storage(storage_err) if storage_err.is_validation() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "invalid_file",
                "message": storage_err.to_string()
            })),
        )
            .into_response(),
        PostError::Storage(_) | PostError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

/// Convert the domain aggregate into the response shape.
fn to_post_response(created: PostWithAttachments) -> PostResponse {
    PostResponse {
        id: created.post.id,
        user_id: created.post.user_id,
        body: created.post.body,
        created_at: created.post.created_at.to_rfc3339(),
        updated_at: created.post.updated_at.to_rfc3339(),
        attachments: created
            .attachments
            .into_iter()
            .map(|a| AttachmentResponse {
                id: a.id,
                name: a.name,
                mime_type: a.mime_type,
                size_bytes: a.size_bytes,
                created_by: a.created_by,
                created_at: a.created_at.to_rfc3339(),
            })
            .collect(),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/posts`
/// Create a post with optional file attachments.
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> impl IntoResponse {
    let form = match collect_post_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let service = post_service(&state);
    let input = CreatePostInput {
        owner_id: auth.user_id(),
        body: form.body,
        files: form.files,
    };

    match service.create(input).await {
        Ok(created) => {
            info!(
                post_id = %created.post.id,
                user_id = %created.post.user_id,
                attachments = created.attachments.len(),
                "Post created"
            );
            (StatusCode::CREATED, Json(to_post_response(created))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create post");
            post_error_response(&e)
        }
    }
}

/// GET `/posts/{post_id}`
/// Fetch a post with its attachments.
async fn get_post(State(state): State<AppState>, Path(post_id): Path<Uuid>) -> impl IntoResponse {
    let service = post_service(&state);

    match service.get(post_id).await {
        Ok(found) => (StatusCode::OK, Json(to_post_response(found))).into_response(),
        Err(e) => post_error_response(&e),
    }
}

/// PUT `/posts/{post_id}`
/// Update a post's body and attachment set.
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
    multipart: Multipart,
) -> impl IntoResponse {
    let form = match collect_post_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let service = post_service(&state);
    let input = UpdatePostInput {
        post_id,
        owner_id: auth.user_id(),
        body: form.body,
        deleted_attachment_ids: form.deleted_attachment_ids,
        files: form.files,
    };

    match service.update(input).await {
        Ok(updated) => {
            info!(post_id = %post_id, "Post updated");
            (StatusCode::OK, Json(to_post_response(updated))).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id = %post_id, "Failed to update post");
            post_error_response(&e)
        }
    }
}

/// DELETE `/posts/{post_id}`
/// Destroy a post, its attachments, and their blobs.
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = post_service(&state);

    match service.destroy(post_id, auth.user_id()).await {
        Ok(()) => {
            info!(post_id = %post_id, "Post deleted");
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e) => {
            error!(error = %e, post_id = %post_id, "Failed to delete post");
            post_error_response(&e)
        }
    }
}

/// POST `/posts/{post_id}/reactions`
/// Toggle the caller's reaction on a post.
async fn toggle_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<ReactionRequest>,
) -> impl IntoResponse {
    // The target must exist; a reaction on a missing post is a 404, not a
    // dangling row.
    let service = post_service(&state);
    if let Err(e) = service.get(post_id).await {
        return post_error_response(&e);
    }

    let reaction_repo = ReactionRepository::new((*state.db).clone());
    let reaction_service = ReactionService::new(Arc::new(reaction_repo));

    match reaction_service
        .toggle(auth.user_id(), post_id, TargetKind::Post, &payload.reaction)
        .await
    {
        Ok(summary) => {
            info!(
                post_id = %post_id,
                user_id = %auth.user_id(),
                has_reaction = summary.current_user_has_reaction,
                "Reaction toggled"
            );
            (
                StatusCode::OK,
                Json(ReactionResponse {
                    num_of_reactions: summary.num_of_reactions,
                    current_user_has_reaction: summary.current_user_has_reaction,
                }),
            )
                .into_response()
        }
        Err(ReactionError::UnsupportedReaction(raw)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "unsupported_reaction",
                "message": format!("Unsupported reaction type: {raw}")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, post_id = %post_id, "Failed to toggle reaction");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deleted_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_deleted_id(&id.to_string()), Ok(id));
        assert_eq!(parse_deleted_id(&format!("  {id} ")), Ok(id));
        assert!(parse_deleted_id("not-a-uuid").is_err());
        assert!(parse_deleted_id("").is_err());
    }

    #[test]
    fn test_post_error_status_codes() {
        let id = Uuid::new_v4();

        assert_eq!(
            post_error_response(&PostError::NotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            post_error_response(&PostError::AttachmentNotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            post_error_response(&PostError::Unauthorized).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            post_error_response(&PostError::validation("empty post")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            post_error_response(&PostError::Storage(StorageError::invalid_mime_type(
                "application/x-executable"
            )))
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            post_error_response(&PostError::Storage(StorageError::file_too_large(20, 10)))
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            post_error_response(&PostError::repository("connection reset")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
