//! Attachment download routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use murmur_core::post::{PostError, PostService};
use murmur_core::storage::StorageError;
use murmur_db::repositories::PostRepository;

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/attachments/{attachment_id}/download", get(download))
}

/// Build a Content-Disposition header value for an attachment download.
///
/// Quotes and control characters in the stored name are replaced so the
/// value stays a valid single header line.
fn content_disposition(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// GET `/attachments/{attachment_id}/download`
/// Stream an attachment's payload with its original filename.
async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attachment_id): Path<Uuid>,
) -> Response {
    let repo = PostRepository::new((*state.db).clone());
    let service = PostService::new(state.storage.clone(), Arc::new(repo));

    match service.download(attachment_id).await {
        Ok(download) => {
            info!(
                attachment_id = %attachment_id,
                user_id = %auth.user_id(),
                bytes = download.data.len(),
                "Attachment downloaded"
            );

            (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, download.mime_type),
                    (CONTENT_DISPOSITION, content_disposition(&download.name)),
                ],
                download.data,
            )
                .into_response()
        }
        Err(
            PostError::AttachmentNotFound(_) | PostError::Storage(StorageError::NotFound { .. }),
        ) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "attachment_not_found",
                "message": "Attachment not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, attachment_id = %attachment_id, "Failed to download attachment");
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
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes_and_controls() {
        assert_eq!(
            content_disposition("we\"ird\n.pdf"),
            "attachment; filename=\"we_ird_.pdf\""
        );
    }
}
