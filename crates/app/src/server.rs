//! HTTP surface for the RAG engine.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/upload` | Multipart upload; starts background indexing |
//! | `GET`  | `/job/{job_id}` | Poll an ingestion job |
//! | `POST` | `/ask` | Answer a question from the indexed fragments |
//!
//! Errors use a JSON envelope: `{ "error": { "code": "...", "message": "..." } }`.
//! Ingestion failures never surface here — the upload was already
//! acknowledged, so they land on the job record instead.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rag_engine_core::{
    AnswerEngine, ChromaStore, GroqGenerator, IngestionJob, IngestionPipeline, JobStore,
    QueryAnswer, QueryError, DEFAULT_TOP_K,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "pptx", "txt", "md"];

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobStore,
    pub pipeline: Arc<IngestionPipeline>,
    pub engine: Arc<AnswerEngine<ChromaStore, GroqGenerator>>,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/job/{job_id}", get(handle_job_status))
        .route("/ask", post(handle_ask))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<QueryError> for AppError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::InvalidArgument(message) => bad_request(message),
            QueryError::Index(inner) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "index_error".to_string(),
                message: inner.to_string(),
            },
        }
    }
}

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "message": "rag-engine is operational",
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    filename: String,
    chunks_count: usize,
    job_id: String,
}

/// Accepts the upload, persists it, and acknowledges with a job id; the
/// actual extraction and indexing run on the ingestion workers.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| bad_request(format!("malformed multipart body: {error}")))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| bad_request("file field carries no filename"))?;
            let bytes = field
                .bytes()
                .await
                .map_err(|error| bad_request(format!("failed to read upload: {error}")))?;
            upload = Some((filename, bytes));
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| bad_request("multipart field 'file' is required"))?;
    let filename = sanitize_filename(&filename)?;
    if !accepted_extension(&filename) {
        return Err(bad_request("Invalid format. PDF, PPTX, TXT, or MD required."));
    }

    let path = state.upload_dir.join(&filename);
    if let Err(error) = tokio::fs::write(&path, &bytes).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(internal_error(format!("Upload failed: {error}")));
    }

    let job = state.pipeline.submit(&path, &filename).await;
    info!(job = %job.id, file = %filename, bytes = bytes.len(), "upload accepted");

    Ok(Json(UploadResponse {
        message: "Upload successful. Indexing started in background.".to_string(),
        filename,
        chunks_count: 0,
        job_id: job.id,
    }))
}

/// Strips any directory components a client smuggles into the filename.
fn sanitize_filename(raw: &str) -> Result<String, AppError> {
    std::path::Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| bad_request("upload filename is not usable"))
}

fn accepted_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}

async fn handle_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<IngestionJob>, AppError> {
    state
        .jobs
        .get(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| not_found(format!("no job with id {job_id}")))
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    top_k: Option<usize>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<QueryAnswer>, AppError> {
    let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
    let answer = state.engine.answer(&request.question, top_k).await?;
    Ok(Json(answer))
}

#[cfg(test)]
mod tests {
    use super::{accepted_extension, sanitize_filename};

    #[test]
    fn known_document_extensions_are_accepted() {
        assert!(accepted_extension("report.pdf"));
        assert!(accepted_extension("DECK.PPTX"));
        assert!(accepted_extension("notes.txt"));
        assert!(accepted_extension("readme.md"));
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(!accepted_extension("archive.zip"));
        assert!(!accepted_extension("no_extension"));
        assert!(!accepted_extension("trailing."));
    }

    #[test]
    fn path_components_are_stripped_from_filenames() {
        assert_eq!(sanitize_filename("../../etc/passwd.txt").unwrap(), "passwd.txt");
        assert_eq!(sanitize_filename("plain.pdf").unwrap(), "plain.pdf");
    }
}
