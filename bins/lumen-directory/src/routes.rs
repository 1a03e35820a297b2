use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use lumen_core::cancel::Cancellation;
use lumen_core::error::ReputationError;
use lumen_core::traits::ReputationStore;
use lumen_trust::{GraphView, RelationsView, ReputationService, ScoreView};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

const NO_DATA: &str = "no reputation data yet";

// ── Error helper ─────────────────────────────────────────────────────────────

pub enum ApiError {
    /// The account has no data to show.
    NotFound,
    /// Store failure, cancellation or a panicked worker. Logged, never echoed.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": NO_DATA }))).into_response()
            }
            ApiError::Internal(e) => {
                error!(error = %format!("{e:#}"), "directory: request failed");
                let body = json!({ "error": "internal error" });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<ReputationError> for ApiError {
    fn from(e: ReputationError) -> Self { ApiError::Internal(e.into()) }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self { ApiError::Internal(e.into()) }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn found<T>(value: Option<T>) -> ApiResult<T> {
    value.map(Json).ok_or(ApiError::NotFound)
}

// ── Blocking bridge ──────────────────────────────────────────────────────────

/// Cancels the token when the request future is dropped.
struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Run a service call on the blocking pool under the request deadline.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ReputationService<dyn ReputationStore>, &Cancellation) -> Result<T, ReputationError>
        + Send
        + 'static,
{
    let service = state.service.clone();
    let cancel = Cancellation::with_timeout(state.request_timeout);
    let _guard = CancelOnDrop(cancel.clone());
    let value = tokio::task::spawn_blocking(move || call(service.as_ref(), &cancel)).await??;
    Ok(value)
}

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/account/:id/score", get(account_score))
        .route("/api/account/:id/graph", get(account_graph))
        .route("/api/account/:id/relations", get(account_relations))
        .layer(cors)
        .with_state(state)
}

// ── /api/health ──────────────────────────────────────────────────────────────

async fn health(State(s): State<AppState>) -> Json<Value> {
    Json(json!({
        "status":     "ok",
        "max_weight": s.service.config().max_weight,
        "timeout_ms": u64::try_from(s.request_timeout.as_millis()).unwrap_or(u64::MAX),
    }))
}

// ── /api/account/:id/score ───────────────────────────────────────────────────

async fn account_score(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ScoreView> {
    found(blocking(&s, move |svc, cancel| svc.get_score(&id, cancel)).await?)
}

// ── /api/account/:id/graph ───────────────────────────────────────────────────

async fn account_graph(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<GraphView> {
    found(blocking(&s, move |svc, cancel| svc.get_graph(&id, cancel)).await?)
}

// ── /api/account/:id/relations ───────────────────────────────────────────────

async fn account_relations(
    State(s): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RelationsView> {
    found(blocking(&s, move |svc, cancel| svc.get_relations(&id, cancel)).await?)
}
