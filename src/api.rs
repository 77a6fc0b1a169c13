//! REST API Server for the financial document Q&A assistant
//!
//! Exposes sessions, uploads and questions via HTTP endpoints

use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::QaError;
use crate::extractor::FactExtractor;
use crate::loader::DocumentLoader;
use crate::session::LoadedDocument;
use crate::state::{InMemorySessionStore, SessionStore};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AskRequest {
    pub question: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(status: StatusCode, data: T) -> ApiResult {
    (status, Json(ApiResponse::success(data)))
}

/// Map a crate error onto its HTTP status
pub fn error_status(err: &QaError) -> StatusCode {
    match err {
        e if e.is_document_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
        QaError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        QaError::NoDocument => StatusCode::CONFLICT,
        QaError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: QaError) -> ApiResult {
    let status = error_status(&err);
    warn!(status = %status, error = %err, "Request failed");
    (status, Json(ApiResponse::error(err.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<dyn SessionStore>,
    pub loader: Arc<DocumentLoader>,
    pub extractor: Arc<FactExtractor>,
    pub config: Arc<AppConfig>,
}

impl ApiState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new(
                config.history_limit,
                config.max_sessions,
            )),
            loader: Arc::new(DocumentLoader::new(config.sheet_mode)),
            extractor: Arc::new(FactExtractor::new()),
            config: Arc::new(config),
        }
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Session Endpoints
/// =============================

async fn create_session(State(state): State<ApiState>) -> ApiResult {
    match state.sessions.create().await {
        Ok(session_id) => ok(
            StatusCode::CREATED,
            serde_json::json!({ "session_id": session_id }),
        ),
        Err(e) => failure(e),
    }
}

async fn delete_session(
    State(state): State<ApiState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult {
    match state.sessions.remove(session_id).await {
        Ok(()) => ok(
            StatusCode::OK,
            serde_json::json!({ "session_id": session_id, "removed": true }),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Upload Endpoint
/// =============================

async fn upload_document(
    State(state): State<ApiState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult {
    if !state.sessions.exists(session_id).await {
        return failure(QaError::SessionNotFound(session_id));
    }

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (e.status(), Json(ApiResponse::error(e.body_text())));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        match field.bytes().await {
            Ok(bytes) => {
                upload = Some((file_name, bytes));
                break;
            }
            Err(e) => {
                return (e.status(), Json(ApiResponse::error(e.body_text())));
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        return failure(QaError::InvalidRequest(
            "multipart field 'file' is missing".to_string(),
        ));
    };

    info!(
        session_id = %session_id,
        file = %file_name,
        bytes = bytes.len(),
        "Received document upload"
    );

    let loader = Arc::clone(&state.loader);
    let extractor = Arc::clone(&state.extractor);
    let processed = tokio::task::spawn_blocking(move || {
        LoadedDocument::process(&loader, &extractor, &file_name, &bytes)
    })
    .await;

    let document = match processed {
        Ok(Ok(document)) => document,
        Ok(Err(e)) => return failure(e),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Document worker failed: {}", e))),
            );
        }
    };

    match state.sessions.install_document(session_id, document).await {
        Ok(summary) => ok(
            StatusCode::OK,
            serde_json::json!({
                "message": summary.message(),
                "summary": summary,
            }),
        ),
        Err(e) => failure(e),
    }
}

/// =============================
/// Question Endpoint
/// =============================

async fn ask_question(
    State(state): State<ApiState>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return failure(QaError::InvalidRequest(rejection.body_text())),
    };

    match state.sessions.ask(session_id, &req.question).await {
        Ok(answer) => {
            info!(session_id = %session_id, topic = ?answer.topic, "Question answered");
            ok(StatusCode::OK, answer)
        }
        Err(e) => failure(e),
    }
}

/// =============================
/// History & Debug Endpoints
/// =============================

async fn get_history(State(state): State<ApiState>, Path(session_id): Path<Uuid>) -> ApiResult {
    match state.sessions.history(session_id).await {
        Ok(exchanges) => ok(StatusCode::OK, exchanges),
        Err(e) => failure(e),
    }
}

async fn clear_history(
    State(state): State<ApiState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult {
    match state.sessions.clear_history(session_id).await {
        Ok(()) => ok(
            StatusCode::OK,
            serde_json::json!({ "session_id": session_id, "cleared": true }),
        ),
        Err(e) => failure(e),
    }
}

async fn debug_report(State(state): State<ApiState>, Path(session_id): Path<Uuid>) -> ApiResult {
    match state
        .sessions
        .debug_report(session_id, state.config.preview_chars)
        .await
    {
        Ok(report) => ok(StatusCode::OK, report),
        Err(e) => failure(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", axum::routing::delete(delete_session))
        .route("/api/sessions/:id/documents", post(upload_document))
        .route("/api/sessions/:id/ask", post(ask_question))
        .route("/api/sessions/:id/history", get(get_history).delete(clear_history))
        .route("/api/sessions/:id/debug", get(debug_report))
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
