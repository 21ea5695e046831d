//! HTTP front end.
//!
//! Thin axum handlers over [`LogService`]: each route parses its request,
//! calls one service operation and renders the result as JSON or as an
//! attachment stream. Failures render as `{"error": "<message>"}` with the
//! status of the error's [`ErrorKind`](crate::ErrorKind); server-side details
//! are logged, not returned.

use crate::config::{PipelineConfig, ServerConfig};
use crate::error::Log2TxtError;
use crate::output::{Download, UploadedFile};
use crate::service::LogService;
use crate::storage::FsStore;
use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Multipart field carrying conversion uploads.
pub const CONVERT_FIELD: &str = "file";
/// Multipart field carrying merge uploads.
pub const MERGE_FIELD: &str = "files";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`Log2TxtError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Log2TxtError);

impl From<Log2TxtError> for ApiError {
    fn from(e: Log2TxtError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if status.is_server_error() {
            error!("Request failed: {}", self.0);
            "Internal Server Error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Open the scratch directory and every extra area, and bind them to a
/// [`LogService`].
pub async fn build_service(
    server: &ServerConfig,
    pipeline: PipelineConfig,
) -> Result<LogService, Log2TxtError> {
    let scratch = FsStore::open(&server.scratch_dir).await?;
    info!("Scratch directory: {}", scratch.root().display());
    let mut service = LogService::new(Arc::new(scratch), pipeline);
    for (name, dir) in &server.extra_areas {
        let store = FsStore::open(dir).await?;
        info!("Download area '{}': {}", name, store.root().display());
        service = service.with_area(name.clone(), Arc::new(store));
    }
    Ok(service)
}

/// Build the application router.
pub fn router(service: Arc<LogService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/convert", post(convert))
        .route("/api/merge-logs", post(merge_logs))
        .route("/api/merge-txt", post(merge_txt))
        .route("/api/download", get(download))
        .route("/api/download-all", get(download_all))
        .route("/api/clear-cache", post(clear_cache))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ── Health ───────────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ready(State(service): State<Arc<LogService>>) -> impl IntoResponse {
    if service.store().is_available().await {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unavailable" })),
        )
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

async fn convert(
    State(service): State<Arc<LogService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let files = read_uploads(multipart, CONVERT_FIELD).await?;
    Ok(Json(service.convert(files).await?))
}

async fn merge_logs(
    State(service): State<Arc<LogService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let files = read_uploads(multipart, MERGE_FIELD).await?;
    Ok(Json(service.merge_logs(files).await?))
}

#[derive(Debug, Deserialize)]
struct MergeTextRequest {
    #[serde(default)]
    files: Vec<String>,
}

async fn merge_txt(
    State(service): State<Arc<LogService>>,
    body: Result<Json<MergeTextRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) =
        body.map_err(|e| Log2TxtError::Validation(format!("invalid request body: {e}")))?;
    Ok(Json(service.merge_text(&request.files).await?))
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    filename: Option<String>,
    folder: Option<String>,
}

async fn download(
    State(service): State<Arc<LogService>>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let filename = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| Log2TxtError::Validation("Filename is required.".into()))?;
    let folder = query.folder.filter(|f| !f.is_empty());
    let dl = service.download(&filename, folder.as_deref()).await?;
    Ok(attachment(dl))
}

async fn download_all(State(service): State<Arc<LogService>>) -> ApiResult<Response> {
    Ok(attachment(service.download_all().await?))
}

async fn clear_cache(State(service): State<Arc<LogService>>) -> ApiResult<impl IntoResponse> {
    let report = service.clear_cache().await?;
    Ok(Json(serde_json::json!({ "message": report.message })))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Collect every file part named `field`, in request order. Other parts are
/// ignored.
async fn read_uploads(
    multipart: Result<Multipart, MultipartRejection>,
    field: &str,
) -> Result<Vec<UploadedFile>, Log2TxtError> {
    let mut multipart =
        multipart.map_err(|e| Log2TxtError::Validation(format!("invalid upload: {e}")))?;

    let mut files = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| Log2TxtError::Validation(format!("invalid upload: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let name = part.file_name().unwrap_or_default().to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| Log2TxtError::Validation(format!("invalid upload '{name}': {e}")))?;
        files.push(UploadedFile::new(name, bytes.to_vec()));
    }
    Ok(files)
}

/// Stream a download as an attachment.
fn attachment(dl: Download) -> Response {
    let headers = [
        (header::CONTENT_TYPE, dl.content_type.to_string()),
        (header::CONTENT_LENGTH, dl.len.to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&dl.file_name)),
    ];
    let body = Body::from_stream(ReaderStream::new(dl.reader));
    (headers, body).into_response()
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987
/// `filename*` for everything else.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if fallback == name {
        return format!("attachment; filename=\"{name}\"");
    }

    let mut encoded = String::with_capacity(name.len() * 3);
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(
            content_disposition("merged.txt"),
            "attachment; filename=\"merged.txt\""
        );
    }

    #[test]
    fn quotes_and_unicode_are_escaped() {
        let v = content_disposition("a\"b.txt");
        assert!(v.starts_with("attachment; filename=\"a_b.txt\""), "got: {v}");
        assert!(v.contains("filename*=UTF-8''a%22b.txt"), "got: {v}");

        let v = content_disposition("journal-é.txt");
        assert!(v.contains("filename=\"journal-_.txt\""), "got: {v}");
        assert!(v.contains("journal-%C3%A9.txt"), "got: {v}");
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let err = ApiError(Log2TxtError::io(
            "write '/srv/secret/a.txt'",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Internal Server Error");
    }

    #[test]
    fn client_errors_map_to_status() {
        let resp = ApiError(Log2TxtError::not_found("a.txt")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = ApiError(Log2TxtError::Validation("Filename is required.".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
