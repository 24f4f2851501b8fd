//! Attachment route handlers.
//!
//! Uploads arrive as `multipart/form-data` with the bytes in a `file`
//! field. Downloads stream straight from disk with the original filename
//! and content type restored.

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::StatusCode,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;

use ticketslave_core::{AttachmentId, TicketId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::AttachmentService;
use crate::state::AppState;

/// Multipart field name carrying the file.
const FILE_FIELD: &str = "file";

/// Upload an attachment to a ticket.
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(ticket_id): Path<TicketId>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_filename = field
            .file_name()
            .map(ToOwned::to_owned)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::BadRequest("file field is missing a filename".to_owned()))?;
        let content_type = field
            .content_type()
            .map_or_else(|| "application/octet-stream".to_owned(), ToOwned::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;

        let attachment = AttachmentService::new(&state)
            .upload(ticket_id, user.id, &original_filename, &content_type, &bytes)
            .await?;

        tracing::info!(
            ticket_id = %ticket_id,
            attachment_id = %attachment.id,
            filename = %attachment.original_filename,
            size_bytes = attachment.size_bytes,
            "attachment uploaded"
        );
        return Ok((StatusCode::CREATED, Json(attachment)));
    }

    Err(AppError::BadRequest(format!(
        "multipart body must contain a '{FILE_FIELD}' field"
    )))
}

/// Download an attachment with its original filename.
pub async fn download(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse> {
    let (attachment, file) = AttachmentService::new(&state).download(id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_header_filename(&attachment.original_filename)
    );

    let headers = [
        (CONTENT_TYPE, attachment.content_type),
        (CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}

/// Strip characters that would break or smuggle through the
/// Content-Disposition header.
fn sanitize_header_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_header_filename() {
        assert_eq!(sanitize_header_filename("report.pdf"), "report.pdf");
        assert_eq!(
            sanitize_header_filename("we\"ird\\name\r\n.txt"),
            "weirdname.txt"
        );
    }
}
