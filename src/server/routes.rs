//! Upload, health and landing routes.

use axum::{
    body::Body,
    extract::{Multipart, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::error::{ApiError, ErrorResponse};
use super::AppContext;
use crate::error::SubburnError;
use crate::pipeline::{OutputMode, PipelineResult, UploadRequest};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/file", post(upload_file))
}

/// Query parameters accepted by `POST /file`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// `Files` (default) or `Base64`; a form field of the same name takes precedence
    pub output_type: Option<String>,
}

/// Multipart form accepted by `POST /file` (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Video or audio file
    #[schema(value_type = String, format = Binary)]
    pub media_file: Vec<u8>,
    /// SubRip subtitles, filename must end in `.srt`
    #[schema(value_type = String, format = Binary)]
    pub subtitle_file: Vec<u8>,
    /// Response encoding
    pub output_type: Option<OutputMode>,
    /// Style override for the subtitles filter, e.g. `Fontname=Futura,PrimaryColour=&HFF00`
    pub force_style: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// First line of `ffmpeg -version`, absent when the tool cannot run
    pub media_processor: Option<String>,
}

/// Redirect to the interactive API documentation
#[utoipa::path(
    get,
    path = "/",
    tag = "docs",
    responses((status = 307, description = "Redirect to /docs"))
)]
pub async fn root() -> Redirect {
    Redirect::temporary("/docs")
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let media_processor = ctx.pipeline.media().get_version_info().await.ok();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        media_processor,
    })
}

/// Upload a media file and an SRT file, get the media back with subtitles burned in
#[utoipa::path(
    post,
    path = "/file",
    tag = "subtitles",
    params(UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Data URI (Base64) or file download (Files)", body = String, content_type = "application/octet-stream"),
        (status = 415, description = "Not an SRT file, or no audio/video stream found", body = ErrorResponse),
        (status = 422, description = "Missing form field or unknown output_type", body = ErrorResponse),
        (status = 500, description = "Conversion or subtitle burning failed", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(ctx): State<AppContext>,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let span = tracing::info_span!("upload", request_id = %Uuid::new_v4());

    async move {
        let request = read_upload(multipart, query).await?;
        let result = ctx.pipeline.process(request).await?;
        Ok(into_response(result))
    }
    .instrument(span)
    .await
}

struct UploadedFile {
    bytes: Bytes,
    filename: String,
    content_type: Option<String>,
}

async fn read_upload(mut multipart: Multipart, query: UploadQuery) -> Result<UploadRequest, ApiError> {
    let mut media: Option<UploadedFile> = None;
    let mut subtitles: Option<UploadedFile> = None;
    let mut output_type = query.output_type;
    let mut force_style = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match name.as_str() {
            "media_file" | "video_file" | "subtitle_file" => {
                let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await?;
                let file = UploadedFile {
                    bytes,
                    filename,
                    content_type,
                };
                if name == "subtitle_file" {
                    subtitles = Some(file);
                } else {
                    media = Some(file);
                }
            }
            "output_type" => output_type = Some(field.text().await?),
            "force_style" => {
                let style = field.text().await?;
                force_style = Some(style).filter(|s| !s.trim().is_empty());
            }
            other => tracing::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    let media = media.ok_or_else(|| missing_field("media_file"))?;
    let subtitles = subtitles.ok_or_else(|| missing_field("subtitle_file"))?;
    let output_mode = match output_type.as_deref() {
        Some(value) => value.parse::<OutputMode>()?,
        None => OutputMode::default(),
    };

    Ok(UploadRequest {
        media_bytes: media.bytes,
        media_filename: media.filename,
        media_content_type: media.content_type,
        subtitle_bytes: subtitles.bytes,
        subtitle_filename: subtitles.filename,
        output_mode,
        force_style,
    })
}

fn missing_field(name: &str) -> ApiError {
    SubburnError::InvalidRequest(format!("missing form field '{}'", name)).into()
}

fn into_response(result: PipelineResult) -> Response {
    match result {
        PipelineResult::DataUri(uri) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            uri,
        )
            .into_response(),
        PipelineResult::Download(download) => {
            let disposition = format!("attachment; filename=\"{}\"", download.filename);
            let disposition = HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
            let content_type = HeaderValue::from_str(&download.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                Body::from_stream(download.stream),
            )
                .into_response()
        }
    }
}
