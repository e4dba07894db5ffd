//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        BatchRequest, BatchResponse, HealthResponse, HopRequest, HopResponse, SolveResponse,
        SolvesResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use hopchain_core::{AttemptContext, ChainError, SolveQuery, primitives::MAX_BATCH_SIZE};

/// Caller identity headers.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const GAME_ID_HEADER: &str = "x-game-id";
pub const ATTEMPT_ID_HEADER: &str = "x-attempt-id";

/// HTTP status for an engine error.
pub fn status_for(err: &ChainError) -> StatusCode {
    match err {
        ChainError::MissingContext(_) | ChainError::InvalidWord(_) => StatusCode::BAD_REQUEST,
        ChainError::NoValidHops { .. }
        | ChainError::InvalidPuzzle(_)
        | ChainError::Incomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ChainError::DuplicateSolve { .. } | ChainError::Conflict(_) => StatusCode::CONFLICT,
        ChainError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        ChainError::StorageError(_)
        | ChainError::SerializationError(_)
        | ChainError::ConfigError(_)
        | ChainError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Attempt context from the identity headers. Missing headers stay `None`
/// and are reported by the engine.
pub fn context_from_headers(headers: &HeaderMap) -> AttemptContext {
    AttemptContext {
        owner_id: header_value(headers, USER_ID_HEADER),
        puzzle_id: header_value(headers, GAME_ID_HEADER),
        attempt_id: header_value(headers, ATTEMPT_ID_HEADER),
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Solve count and cache statistics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let solves = state.engine.solves();
    let solve_count = match solves.count() {
        Ok(n) => n,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count solves");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };
    let stats = solves.cache_stats();

    let response = StatusResponse {
        backend: solves.backend_name().to_string(),
        solve_count,
        solve_cache: stats.solves.into(),
        query_cache: stats.queries.into(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

// =============================================================================
// HOP ATTEMPT
// =============================================================================

/// Attempt one hop for the attempt named in the identity headers.
pub async fn attempt_hop_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<HopRequest>,
) -> impl IntoResponse {
    let context = context_from_headers(&headers);

    match state.engine.attempt_hop(&request.word, &context).await {
        Ok(outcome) => (StatusCode::OK, Json(HopResponse::success(outcome))),
        Err(e) => (status_for(&e), Json(HopResponse::error(&e))),
    }
}

// =============================================================================
// SOLVE READS
// =============================================================================

/// Committed solve by id.
pub async fn get_solve_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.engine.get_solve(&id) {
        Ok(Some(solve)) => (StatusCode::OK, Json(SolveResponse::found(solve))),
        Ok(None) => (StatusCode::NOT_FOUND, Json(SolveResponse::not_found())),
        Err(e) => (status_for(&e), Json(SolveResponse::error(e.to_string()))),
    }
}

/// Committed solves matching a filter.
pub async fn query_solves_handler(
    State(state): State<AppState>,
    Json(query): Json<SolveQuery>,
) -> impl IntoResponse {
    match state.engine.query_solves(&query) {
        Ok(solves) => (StatusCode::OK, Json(SolvesResponse::with_solves(solves))),
        Err(e) => (status_for(&e), Json(SolvesResponse::error(e.to_string()))),
    }
}

// =============================================================================
// BATCH
// =============================================================================

/// Finalize a batch of completed attempts.
pub async fn batch_handler(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    if request.records.len() > MAX_BATCH_SIZE {
        return (
            StatusCode::BAD_REQUEST,
            Json(BatchResponse::error(format!(
                "Batch of {} records exceeds maximum {}",
                request.records.len(),
                MAX_BATCH_SIZE
            ))),
        );
    }

    let report = state.engine.finalize_batch(&request.records).await;
    (StatusCode::OK, Json(BatchResponse::from_report(report)))
}

// =============================================================================
// TESTS
// =============================================================================
