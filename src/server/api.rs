use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;

use crate::errors::TurnError;
use crate::guard::{TurnGuard, TurnLease};
use crate::parser::{DocumentParser, DocumentTree};
use crate::period;
use crate::prompts;
use crate::store::EntityRecord;
use crate::stream::{ProgressRecord, progress_stream};
use crate::turn::{CreateRequest, TurnOrchestrator};

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub guard: Arc<dyn TurnGuard>,
    pub parser: DocumentParser,
    pub heartbeat: Duration,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub policy: String,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    /// Comma-separated dotted key paths
    pub keys: Option<String>,
}

impl SnapshotQuery {
    fn paths(&self) -> Option<Vec<String>> {
        let keys = self.keys.as_deref()?;
        let paths: Vec<String> = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        (!paths.is_empty()).then_some(paths)
    }
}

// ── Response types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SnapshotView {
    pub period_key: String,
    pub label: String,
    pub document: DocumentTree,
    pub events: Option<String>,
    pub report: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdviceView {
    pub suggestions: Vec<String>,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retryable) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, false),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, false),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, true),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, false),
        };
        (
            status,
            Json(serde_json::json!({"error": message, "retryable": retryable})),
        )
            .into_response()
    }
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        let msg = err.to_string();
        match err {
            TurnError::Guard(_) => ApiError::Conflict(msg),
            TurnError::EntityNotFound { .. } | TurnError::NoSnapshot { .. } => {
                ApiError::NotFound(msg)
            }
            TurnError::InvalidPeriod { .. } | TurnError::InvalidAnswer { .. } => {
                ApiError::BadRequest(msg)
            }
            _ => ApiError::Internal(msg),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/states", post(create_state))
        .route("/api/states/{id}", get(get_state))
        .route("/api/states/{id}/turns", post(run_turn))
        .route("/api/states/{id}/snapshots", get(list_snapshots))
        .route("/api/states/{id}/lock", get(lock_status))
        .route("/api/states/{id}/advice", get(advice))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

fn ndjson(stream: ReceiverStream<ProgressRecord>) -> Response {
    let body = Body::from_stream(stream.map(|record| Ok::<_, Infallible>(record.to_json_line())));
    ([(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)], body).into_response()
}

async fn require_entity(state: &SharedState, id: &str) -> Result<EntityRecord, ApiError> {
    state
        .orchestrator
        .store()
        .entity(id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("State {} not found", id)))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn create_state(
    State(state): State<SharedState>,
    Json(req): Json<CreateRequest>,
) -> Result<Response, ApiError> {
    // Reject bad input before the stream starts
    period::validate_period(&req.period)?;
    prompts::format_answers(&req.answers)?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let stream = progress_stream(state.heartbeat, move |sink| async move {
        orchestrator
            .create_entity(&req, &sink)
            .await
            .map(ProgressRecord::complete)
    });
    Ok(ndjson(stream))
}

async fn get_state(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(require_entity(&state, &id).await?))
}

async fn run_turn(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Response, ApiError> {
    require_entity(&state, &id).await?;
    let lease = TurnLease::acquire(Arc::clone(&state.guard), &id)
        .map_err(|e| ApiError::Conflict(e.to_string()))?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let stream = progress_stream(state.heartbeat, move |sink| async move {
        let result = orchestrator
            .run_turn(lease.entity_id(), &req.policy, &sink)
            .await
            .map(ProgressRecord::complete);
        // Held until the turn ends, even if the client has gone away
        drop(lease);
        result
    });
    Ok(ndjson(stream))
}

async fn list_snapshots(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_entity(&state, &id).await?;
    let snapshots = state
        .orchestrator
        .store()
        .snapshots(&id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let paths = query.paths();
    let views = snapshots
        .into_iter()
        .map(|snapshot| {
            let document = match &paths {
                Some(paths) => state.parser.parse_filtered(&snapshot.body_text, paths.as_slice()),
                None => state.parser.parse(&snapshot.body_text),
            };
            Ok(SnapshotView {
                label: period::period_label(&snapshot.period_key)?,
                period_key: snapshot.period_key,
                document,
                events: snapshot.prior_events_text,
                report: snapshot.diff_report,
                created_at: snapshot.created_at,
            })
        })
        .collect::<Result<Vec<_>, TurnError>>()?;
    Ok(Json(views))
}

async fn lock_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_entity(&state, &id).await?;
    Ok(Json(state.guard.status(&id)))
}

async fn advice(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_entity(&state, &id).await?;
    let suggestions = state.orchestrator.suggest_policies(&id).await?;
    Ok(Json(AdviceView { suggestions }))
}
