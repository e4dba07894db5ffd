//! # hopchain HTTP API Module
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Solve count and cache statistics
//! - `POST /attempt/hop` - Attempt a hop (`x-user-id`, `x-game-id`,
//!   `x-attempt-id` headers, body `{"word"}`)
//! - `GET /solves/{id}` - Committed solve by id
//! - `POST /solves/query` - Committed solves matching a filter
//! - `POST /solves/batch` - Finalize completed attempts
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `HOPCHAIN_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `HOPCHAIN_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `HOPCHAIN_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use handlers::{
    ATTEMPT_ID_HEADER, GAME_ID_HEADER, USER_ID_HEADER, context_from_headers, status_for,
};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    BatchRequest, BatchResponse, CacheStatsJson, HealthResponse, HopRequest, HopResponse,
    SolveResponse, SolvesResponse, StatusResponse,
};

use crate::collaborators::{HttpGamesApi, HttpHopsApi};
use crate::engine::Engine;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use hopchain_core::ChainError;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// The engine wired to the real collaborators.
pub type ServiceEngine = Engine<HttpHopsApi, HttpGamesApi>;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ServiceEngine>,
}

impl AppState {
    #[must_use]
    pub fn new(engine: ServiceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

/// Router-level security settings.
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    pub api_key: Option<String>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
    /// Raw `HOPCHAIN_CORS_ORIGINS` value.
    pub cors_origins: Option<String>,
}

impl ServerSettings {
    /// Read every knob from the process environment.
    pub fn from_env() -> Self {
        Self {
            api_key: get_api_key_from_env(),
            rate_limit: get_rate_limit_from_env(),
            cors_origins: std::env::var("HOPCHAIN_CORS_ORIGINS").ok(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

fn allowed_headers() -> [HeaderName; 5] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(USER_ID_HEADER),
        HeaderName::from_static(GAME_ID_HEADER),
        HeaderName::from_static(ATTEMPT_ID_HEADER),
    ]
}

/// Build the CORS layer.
///
/// - `"*"`: any origin
/// - unset: localhost only
/// - otherwise: the listed origins; if none parse, localhost only
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (HOPCHAIN_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", origin);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in HOPCHAIN_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers(allowed_headers())
            }
        }
        None => {
            tracing::info!("CORS: No HOPCHAIN_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .map(HeaderValue::from_static)
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(allowed_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState, settings: &ServerSettings) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/attempt/hop", post(handlers::attempt_hop_handler))
        .route("/solves/query", post(handlers::query_solves_handler))
        .route("/solves/batch", post(handlers::batch_handler))
        .route("/solves/{id}", get(handlers::get_solve_handler))
        .with_state(state);

    match settings.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            let key: auth::ApiKey = Arc::from(key);
            router = router.layer(axum_middleware::from_fn_with_state(
                key,
                auth::api_key_auth_middleware,
            ));
        }
        None => tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set HOPCHAIN_API_KEY to enable authentication."
        ),
    }

    match create_rate_limiter(settings.rate_limit) {
        Some(limiter) => {
            tracing::info!("Rate limiting enabled: {} requests/second", settings.rate_limit);
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024))
        .layer(build_cors_layer(settings.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until Ctrl+C.
pub async fn run_server(
    addr: &str,
    engine: ServiceEngine,
    settings: &ServerSettings,
) -> Result<(), ChainError> {
    let router = create_router(AppState::new(engine), settings);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChainError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("hopchain HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ChainError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collaborators::http_collaborators;
    use crate::config::Config;
    use crate::engine::SolveBook;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use hopchain_core::{MemorySolveStore, ResultCache};
    use std::time::Duration;
    use tower::ServiceExt;

    fn router(settings: &ServerSettings) -> Router {
        let config = Config {
            hops_api_url: Some("http://127.0.0.1:9".to_string()),
            games_api_url: Some("http://127.0.0.1:9".to_string()),
            ..Config::default()
        };
        let (hops, games) = http_collaborators(&config).unwrap();
        let book = SolveBook::new(Arc::new(MemorySolveStore::new()), ResultCache::default());
        let engine = Engine::new(hops, games, book, Duration::from_millis(100));
        create_router(AppState::new(engine), settings)
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/attempt/hop")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-user-id,x-attempt-id")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn localhost_preflight_allows_identity_headers() {
        let response = router(&ServerSettings::default())
            .oneshot(preflight("http://localhost:3000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(allowed.contains("x-user-id"));
        assert!(allowed.contains("x-attempt-id"));
    }

    #[tokio::test]
    async fn configured_origins_replace_localhost() {
        let settings = ServerSettings {
            cors_origins: Some("https://play.example.com, not a header\u{7f}".to_string()),
            ..ServerSettings::default()
        };

        let allowed = router(&settings)
            .oneshot(preflight("https://play.example.com"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://play.example.com"
        );

        let refused = router(&settings)
            .oneshot(preflight("http://localhost:3000"))
            .await
            .unwrap();
        assert!(refused.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn unknown_solve_is_not_found() {
        let response = router(&ServerSettings::default())
            .oneshot(Request::get("/solves/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
