//! Image submission, reset and image serving

use crate::error::{ApiError, ApiResult};
use crate::orchestrator::{ImageHandle, Screen};
use crate::services::ImageUpload;
use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tracing::debug;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "image";

/// Pull the image part out of a multipart body
async fn read_upload(mut multipart: Multipart) -> ApiResult<ImageUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(ApiError::BadRequest("No image file provided".to_string()))
}

/// POST /analyze
///
/// Accepts the upload, starts the prediction in the background and sends
/// the browser back to `/`, which shows the analyzing state until the
/// session's events trigger a reload. `409` while an analysis is running.
pub async fn submit_analysis(
    Extension(session): Extension<Arc<Session>>,
    multipart: Multipart,
) -> ApiResult<Redirect> {
    let upload = read_upload(multipart).await?;
    debug!(
        "Session {} uploaded {} ({} bytes)",
        session.id(),
        upload.file_name,
        upload.bytes.len()
    );

    let ticket = session.orchestrator().begin_analysis(upload).await?;
    session.orchestrator().show(Screen::Analyze).await;

    let worker = session.clone();
    tokio::spawn(async move {
        let outcome = worker.orchestrator().run_analysis(ticket).await;
        debug!("Session {} analysis finished: {:?}", worker.id(), outcome);
    });

    Ok(Redirect::to("/"))
}

/// POST /reset
pub async fn reset(Extension(session): Extension<Arc<Session>>) -> Redirect {
    if !session.orchestrator().reset().await {
        debug!("Session {} reset while idle", session.id());
    }
    Redirect::to("/")
}

/// GET /image/:handle
///
/// Serves the selected image until the cycle is reset.
pub async fn serve_image(
    Extension(session): Extension<Arc<Session>>,
    Path(handle): Path<String>,
) -> ApiResult<Response> {
    let handle = ImageHandle::parse(&handle)
        .ok_or_else(|| ApiError::NotFound(format!("Image not found: {}", handle)))?;
    let image = session
        .orchestrator()
        .image(handle)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Image not found: {}", handle)))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        image.bytes,
    )
        .into_response())
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/analyze",
            post(submit_analysis).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/reset", post(reset))
        .route("/image/:handle", get(serve_image))
}
