//! REST API Server for the document chat service
//!
//! Exposes chat sessions over HTTP: configure a session, give it a document
//! and URLs, then ask questions.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ChatError;
use crate::llm::ResponseGenerator;
use crate::memory::MemorySnapshot;
use crate::models::{SessionConfig, Vendor};
use crate::session::{Session, UrlFailure};
use crate::state::SessionRegistry;

/// Largest accepted request body (document uploads)
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// =============================
/// Request Models
/// =============================

/// Partial session configuration; missing fields keep their current value
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ConfigRequest {
    pub session_id: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub memory: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlsRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// =============================
/// Response Models
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

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub config: SessionConfig,
    pub document: Option<String>,
    pub urls: Vec<String>,
    pub memory: MemorySnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionView {
    fn of(session: &Session) -> Self {
        Self {
            session_id: session.id(),
            config: session.config().clone(),
            document: session.document().map(|d| d.file_name.clone()),
            urls: session.urls().map(String::from).collect(),
            memory: session.memory_snapshot(),
            created_at: session.created_at(),
            updated_at: session.updated_at(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn failure(error: ChatError) -> ApiResult {
    let status = match &error {
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::UnsupportedFileType(_)
        | ChatError::ExtractionError(_)
        | ChatError::UrlFetchError { .. }
        | ChatError::NoContent
        | ChatError::InvalidRequest(_)
        | ChatError::InvalidModel { .. } => StatusCode::BAD_REQUEST,
        e if e.is_backend_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }

    (status, Json(ApiResponse::error(error.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<AppConfig>,
    pub client: Client,
    pub sessions: Arc<SessionRegistry>,
}

impl ApiState {
    pub fn new(config: AppConfig, client: Client) -> Self {
        Self {
            config: Arc::new(config),
            client,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Accept either a UUID or any client-chosen chat id
fn session_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value.trim()).unwrap_or_else(|_| stable_uuid_from_string(value.trim()))
}

/// Merge a partial request onto an existing configuration. Switching vendor
/// without naming a model picks that vendor's default model.
fn resolve_config(base: &SessionConfig, req: &ConfigRequest) -> crate::Result<SessionConfig> {
    let vendor = match req.vendor.as_deref() {
        Some(v) => v.parse::<Vendor>()?,
        None => base.vendor,
    };

    let model = match req.model.as_deref() {
        Some(m) => m.trim().to_string(),
        None if vendor == base.vendor => base.model.clone(),
        None => vendor.default_model().to_string(),
    };

    let memory = match req.memory.as_deref() {
        Some(m) => m.parse()?,
        None => base.memory,
    };

    let config = SessionConfig {
        vendor,
        model,
        memory,
    };
    config.validate()?;
    Ok(config)
}

/// =============================
/// Handlers
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.sessions.len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(
    State(state): State<ApiState>,
    payload: Option<Json<ConfigRequest>>,
) -> ApiResult {
    let req = payload.map(|Json(req)| req).unwrap_or_default();

    let config = match resolve_config(&state.config.session_defaults, &req) {
        Ok(config) => config,
        Err(e) => return failure(e),
    };

    let id = req
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(session_uuid)
        .unwrap_or_else(Uuid::new_v4);

    match state.sessions.get_or_create(id, config).await {
        Ok((session, created)) => {
            let session = session.lock().await;
            let status = if created { StatusCode::CREATED } else { StatusCode::OK };
            (status, Json(ApiResponse::success(SessionView::of(&session))))
        }
        Err(e) => failure(e),
    }
}

async fn get_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => ok(SessionView::of(&*session.lock().await)),
        Err(e) => failure(e),
    }
}

async fn delete_session(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    match state.sessions.remove(session_uuid(&id)).await {
        Ok(()) => ok(serde_json::json!({ "deleted": true })),
        Err(e) => failure(e),
    }
}

async fn update_config(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<ConfigRequest>,
) -> ApiResult {
    let session = match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => session,
        Err(e) => return failure(e),
    };
    let mut session = session.lock().await;

    let result = resolve_config(session.config(), &req).and_then(|config| session.configure(config));
    match result {
        Ok(()) => ok(SessionView::of(&session)),
        Err(e) => failure(e),
    }
}

async fn upload_document(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult {
    let session = match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => session,
        Err(e) => return failure(e),
    };

    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
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
                        return failure(ChatError::InvalidRequest(format!(
                            "failed to read upload: {}",
                            e
                        )))
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return failure(ChatError::InvalidRequest(format!(
                    "invalid multipart body: {}",
                    e
                )))
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        return failure(ChatError::InvalidRequest(
            "multipart field 'file' is required".to_string(),
        ));
    };

    info!(file_name = %file_name, bytes = bytes.len(), "Received document upload");

    let mut session = session.lock().await;
    match session.upload_document(&file_name, &bytes) {
        Ok(()) => ok(SessionView::of(&session)),
        Err(e) => failure(e),
    }
}

async fn clear_document(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => {
            let mut session = session.lock().await;
            session.clear_document();
            ok(SessionView::of(&session))
        }
        Err(e) => failure(e),
    }
}

#[derive(Debug, Serialize)]
struct UrlsResponse {
    failures: Vec<UrlFailure>,
    session: SessionView,
}

async fn set_urls(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UrlsRequest>,
) -> ApiResult {
    let session = match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => session,
        Err(e) => return failure(e),
    };
    let mut session = session.lock().await;

    let failures = session.set_urls(&state.client, req.urls).await;
    ok(UrlsResponse {
        failures,
        session: SessionView::of(&session),
    })
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory_warning: Option<String>,
    vendor: Vendor,
    model: String,
    memory: MemorySnapshot,
}

async fn ask(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<AskRequest>,
) -> ApiResult {
    let session = match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => session,
        Err(e) => return failure(e),
    };
    let mut session = session.lock().await;

    // Input problems are reported before vendor credentials are checked
    if req.question.trim().is_empty() {
        return failure(ChatError::InvalidRequest("question is empty".to_string()));
    }
    if !session.has_content() {
        return failure(ChatError::NoContent);
    }

    let generator =
        match ResponseGenerator::from_config(&state.config, session.config(), state.client.clone())
        {
            Ok(generator) => generator,
            Err(e) => return failure(e),
        };

    match session.ask(&req.question, &generator).await {
        Ok(outcome) => ok(AskResponse {
            answer: outcome.answer,
            memory_warning: outcome.memory_warning,
            vendor: session.config().vendor,
            model: session.config().model.clone(),
            memory: session.memory_snapshot(),
        }),
        Err(e) => failure(e),
    }
}

async fn get_memory(State(state): State<ApiState>, Path(id): Path<String>) -> ApiResult {
    match state.sessions.get(session_uuid(&id)).await {
        Ok(session) => ok(session.lock().await.memory_snapshot()),
        Err(e) => failure(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/config", put(update_config))
        .route(
            "/api/sessions/:id/document",
            post(upload_document).delete(clear_document),
        )
        .route("/api/sessions/:id/urls", put(set_urls))
        .route("/api/sessions/:id/ask", post(ask))
        .route("/api/sessions/:id/memory", get(get_memory))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
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
