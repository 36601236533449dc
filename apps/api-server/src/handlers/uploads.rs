//! Thumbnail uploads.

use std::path::Path;

use actix_web::{HttpResponse, web};
use futures::StreamExt;
use mime_guess::mime;

use typelab_shared::dto::{UploadParams, UploadResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Lowercased extension of `filename` if it names an image type.
fn image_extension(filename: &str) -> AppResult<String> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| AppError::Validation(format!("'{filename}' has no file extension")))?;

    let is_image = mime_guess::from_ext(&ext)
        .first()
        .is_some_and(|m| m.type_() == mime::IMAGE);
    if !is_image {
        return Err(AppError::Validation(format!(
            "'.{ext}' is not an image type"
        )));
    }

    Ok(ext)
}

/// POST /api/uploads/thumbnails?filename=
///
/// The request body is the raw file. Stored under
/// `{user_id}/thumbnail-{millis}.{ext}`.
pub async fn upload_thumbnail(
    state: web::Data<AppState>,
    identity: Identity,
    params: web::Query<UploadParams>,
    mut payload: web::Payload,
) -> AppResult<HttpResponse> {
    let ext = image_extension(&params.filename)?;
    let limit = state.max_upload_bytes;

    let mut bytes = Vec::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(AppError::Validation("upload body is empty".to_string()));
    }

    let path = format!(
        "{}/thumbnail-{}.{}",
        identity.user_id,
        chrono::Utc::now().timestamp_millis(),
        ext
    );
    let stored = state.blobs.upload(&path, bytes).await?;

    Ok(HttpResponse::Created().json(UploadResponse {
        path: stored.path,
        public_url: stored.public_url,
    }))
}
