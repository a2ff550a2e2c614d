//! HTTP API server for the RAG endpoints.
//!
//! Exposes chat, stats, backfill and single-job ingestion to the host application.

use crate::cli::Output;
use crate::config::{RagSettings, Settings};
use crate::pipeline::IngestPipeline;
use crate::rag::{RagService, RagStats};
use crate::services::Services;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const NOT_INITIALIZED: &str = "RAG service not initialized";

/// Shared application state.
pub struct AppState {
    rag: Option<Arc<RagService>>,
    pipeline: Option<Arc<IngestPipeline>>,
    inactive_reason: Option<String>,
    chat_timeout: Duration,
    stats_timeout: Duration,
}

impl AppState {
    pub fn new(services: Services, rag: &RagSettings) -> Self {
        Self {
            rag: services.rag,
            pipeline: services.pipeline,
            inactive_reason: services.inactive_reason,
            chat_timeout: Duration::from_secs(rag.chat_timeout_secs),
            stats_timeout: Duration::from_secs(rag.stats_timeout_secs),
        }
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/rag/chat", post(chat))
        .route("/rag/stats", get(stats))
        .route("/rag/backfill", post(backfill))
        .route("/rag/ingest/{job_id}", post(ingest))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let services = Services::initialize(&settings).await?;
    if let Some(reason) = &services.inactive_reason {
        Output::warning(reason);
    }

    let state = Arc::new(AppState::new(services, &settings.rag));
    let app = router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Husk API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /rag/chat");
    Output::kv("Stats", "GET  /rag/stats");
    Output::kv("Backfill", "POST /rag/backfill");
    Output::kv("Ingest", "POST /rag/ingest/{job_id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
    model: String,
    #[serde(default)]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    query: String,
}

#[derive(Serialize)]
struct BackfillResponse {
    message: String,
    total: usize,
    processed: usize,
    failed: usize,
}

#[derive(Serialize)]
struct IngestResponse {
    job_id: String,
    status: &'static str,
    summarized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            )
        }
    };

    if req.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "query must not be empty");
    }
    if req.model.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "model must not be empty");
    }

    let Some(rag) = &state.rag else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NOT_INITIALIZED);
    };

    let answer = tokio::time::timeout(
        state.chat_timeout,
        rag.chat(&req.query, &req.model, req.temperature),
    )
    .await;

    match answer {
        Ok(Ok(response)) => Json(ChatResponse {
            response,
            query: req.query,
        })
        .into_response(),
        Ok(Err(e)) => {
            warn!("Chat failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate response: {}", e),
            )
        }
        Err(_) => {
            warn!("Chat timed out after {:?}", state.chat_timeout);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Chat timed out after {}s", state.chat_timeout.as_secs()),
            )
        }
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    let Some(rag) = &state.rag else {
        let message = state.inactive_reason.as_deref().unwrap_or(NOT_INITIALIZED);
        return Json(RagStats::inactive(message)).into_response();
    };

    match tokio::time::timeout(state.stats_timeout, rag.stats()).await {
        Ok(Ok(stats)) => Json(stats).into_response(),
        Ok(Err(e)) => {
            warn!("Stats failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RagStats::error(e.to_string())),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RagStats::error(format!(
                "stats timed out after {}s",
                state.stats_timeout.as_secs()
            ))),
        )
            .into_response(),
    }
}

async fn backfill(State(state): State<Arc<AppState>>) -> Response {
    let Some(pipeline) = &state.pipeline else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NOT_INITIALIZED);
    };

    match pipeline.backfill().await {
        Ok(report) => {
            info!(
                "Backfill via API: {} processed, {} failed",
                report.processed, report.failed
            );
            Json(BackfillResponse {
                message: "Backfill completed".to_string(),
                total: report.total,
                processed: report.processed,
                failed: report.failed,
            })
            .into_response()
        }
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Backfill failed: {}", e),
        ),
    }
}

async fn ingest(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> Response {
    let Some(pipeline) = &state.pipeline else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, NOT_INITIALIZED);
    };

    match pipeline.on_transcription_completed(&job_id).await {
        Ok(outcome) => Json(IngestResponse {
            status: outcome.label(),
            summarized: outcome.summarized(),
            message: outcome.message(),
            job_id,
        })
        .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load job {}: {}", job_id, e),
        ),
    }
}
