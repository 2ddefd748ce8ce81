//! Image upload and serving.
//!
//! Uploads arrive as multipart form data in the `image` field. Only image
//! types on the allow-list are accepted, checked against both the file
//! extension and the declared MIME type. Files are stored under a fresh
//! name (`<millis>-<uuid>.<ext>`) so client names never reach the disk.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use folio_types::now_millis;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::constants::{ALLOWED_IMAGE_TYPES, UPLOADS_ROUTE, UPLOAD_FIELD};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

/// Lower-cased extension of `file_name`, if any.
fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// MIME type served for an allowed extension.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
}

/// Check an upload against the allow-list; returns the extension to store
/// it under. Both the extension and the declared MIME type must be allowed.
fn accepted_extension(file_name: &str, content_type: Option<&str>) -> Option<String> {
    let ext = extension(file_name)?;
    mime_for_extension(&ext)?;
    let declared = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(_, mime)| *mime == declared)
        .then_some(ext)
}

/// A stored upload name is one path segment we generated ourselves.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// `POST /api/upload`
#[instrument(name = "http.upload", skip_all)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let ext = accepted_extension(&file_name, field.content_type()).ok_or_else(|| {
            ApiError::BadRequest("Only image files are allowed (jpeg, jpg, png, gif, webp)".into())
        })?;
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        if bytes.len() > limit {
            return Err(ApiError::TooLarge { limit });
        }
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("No file uploaded".into()));
        }

        let stored = format!("{}-{}.{}", now_millis(), Uuid::new_v4(), ext);
        tokio::fs::create_dir_all(&state.uploads_dir).await?;
        tokio::fs::write(state.uploads_dir.join(&stored), &bytes).await?;
        info!(name = %stored, bytes = bytes.len(), original = %file_name, "stored upload");

        return Ok(Json(UploadResponse {
            image_url: format!("{UPLOADS_ROUTE}/{stored}"),
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".into()))
}

fn multipart_error(err: axum::extract::multipart::MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge { limit }
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// `GET /uploads/{name}`
#[instrument(name = "http.serve_upload", skip(state))]
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    if !is_safe_name(&name) {
        return Err(ApiError::NotFound);
    }
    let mime = extension(&name)
        .and_then(|ext| mime_for_extension(&ext))
        .ok_or(ApiError::NotFound)?;
    let bytes = match tokio::fs::read(state.uploads_dir.join(&name)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
