//! Serves stored blobs.

use actix_web::{HttpResponse, http::header, web};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /media/{path}
pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    let bytes = state.blobs.read(&path).await?;
    let content_type = mime_guess::from_path(&path).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(content_type.to_string())
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
