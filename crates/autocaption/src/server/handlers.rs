//! Route handlers.

use autocaption_core::{Autocaption, CaptionError, CaptionLength, Upload, VERSION};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::error::{ApiError, PageError};
use super::pages;

/// Multipart field carrying the image.
const PHOTO_FIELD: &str = "photo";
/// Multipart field carrying the caption length.
const LENGTH_FIELD: &str = "length";

pub async fn form(State(app): State<Autocaption>) -> Html<String> {
    Html(pages::upload_form(&app.config().caption))
}

/// `POST /`: caption the upload and render the result page.
pub async fn upload(
    State(app): State<Autocaption>,
    multipart: Multipart,
) -> Result<Html<String>, PageError> {
    let upload = read_upload(&app, multipart).await?;
    let result = app.caption_upload(upload).await?;
    Ok(Html(pages::result_page(&result)))
}

/// `GET /uploads/{filename}`: serve a stored image.
pub async fn serve_upload(
    State(app): State<Autocaption>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = app.store().read(&filename).await?;
    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
    pub status_url: String,
    pub image_url: String,
}

/// `POST /api/captions`: store the upload and caption it in the background.
pub async fn create_job(
    State(app): State<Autocaption>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    let upload = read_upload(&app, multipart).await?;
    let queued = app.enqueue_upload(upload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id: queued.job_id,
            status_url: format!("/api/captions/{}", queued.job_id),
            image_url: queued.image.url(),
        }),
    ))
}

/// `GET /api/captions/{id}`
pub async fn get_job(
    State(app): State<Autocaption>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app.job(id).await.ok_or(ApiError::JobNotFound(id))?;
    Ok(Json(record))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub model: String,
    pub pending_posts: usize,
    pub idle_workers: usize,
}

pub async fn health(State(app): State<Autocaption>) -> Json<HealthResponse> {
    let provider = app.captioner().provider();
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        provider: provider.name().to_string(),
        model: provider.model().to_string(),
        pending_posts: app.notifier().pending(),
        idle_workers: app.captioner().idle_workers(),
    })
}

/// Pull the `photo` and `length` fields out of a multipart body.
///
/// Unknown fields are ignored. A missing photo, or one sent without a
/// filename, is [`CaptionError::NoFile`].
async fn read_upload(app: &Autocaption, mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut photo: Option<(String, Vec<u8>)> = None;
    let mut length: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some(PHOTO_FIELD) => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                photo = Some((file_name, bytes.to_vec()));
            }
            Some(LENGTH_FIELD) => {
                length = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let (file_name, bytes) = photo
        .filter(|(name, _)| !name.is_empty())
        .ok_or(CaptionError::NoFile)?;
    let length = CaptionLength::parse(length.as_deref(), &app.config().caption)?;

    tracing::debug!(file = %file_name, size = bytes.len(), length = length.get(), "Received upload");

    Ok(Upload {
        file_name,
        bytes,
        length,
    })
}
