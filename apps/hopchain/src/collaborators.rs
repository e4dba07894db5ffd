//! # Collaborator Clients
//!
//! The hops and games services, seen from hopchain.
//!
//! `HopsApi` and `GamesApi` are the seams the engine depends on. The HTTP
//! implementations here talk to the real services; tests substitute
//! in-process fakes.
//!
//! ## Wire Contract
//!
//! - `GET  {hops}/hops?attemptId=..` -> `[Hop]`
//! - `POST {hops}/hops` with `x-attempt-id`, `x-game-id`, `x-owner-id` and
//!   body `{"from", "to"}` -> `Hop` (non-2xx means the link was rejected)
//! - `DELETE {hops}/hops?attemptId=..`
//! - `GET  {games}/games/{id}` -> `{"id", "words"}`
//!
//! Every request carries the internal secret header when configured.

use crate::config::Config;
use hopchain_core::{AttemptIds, ChainError, Hop, Puzzle};
use serde::Serialize;
use std::future::Future;

/// The hops collaborator.
pub trait HopsApi: Send + Sync {
    /// Every accepted hop of an attempt, in creation order.
    fn list_hops(&self, attempt_id: &str) -> impl Future<Output = Result<Vec<Hop>, ChainError>> + Send;

    /// Ask the hops service to accept a link from `from` to `to`.
    fn create_hop(
        &self,
        ids: &AttemptIds,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<Hop, ChainError>> + Send;

    /// Remove every hop of an attempt.
    fn delete_hops(&self, attempt_id: &str) -> impl Future<Output = Result<(), ChainError>> + Send;
}

/// The games collaborator.
pub trait GamesApi: Send + Sync {
    fn get_puzzle(&self, puzzle_id: &str) -> impl Future<Output = Result<Puzzle, ChainError>> + Send;
}

// =============================================================================
// SHARED HTTP CLIENT
// =============================================================================

/// Body of a hop creation request.
#[derive(Debug, Serialize)]
struct NewHop<'a> {
    from: &'a str,
    to: &'a str,
}

/// One reqwest client plus the secret header every collaborator expects.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    secret_header: Option<(String, String)>,
}

impl ServiceClient {
    /// Build a client for `base_url` using the timeout and secret header
    /// from `config`.
    pub fn new(base_url: &str, config: &Config) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChainError::ConfigError(format!("HTTP client: {e}")))?;

        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| ChainError::ConfigError(format!("Invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ChainError::ConfigError(format!(
                "Base URL '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            http,
            base_url,
            secret_header: config
                .secret_header()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded as one
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build a request with the secret header attached.
    fn request(&self, method: reqwest::Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.endpoint(segments));
        if let Some((name, value)) = &self.secret_header {
            req = req.header(name.as_str(), value.as_str());
        }
        req
    }

    /// Send a request, mapping transport failures and non-2xx statuses.
    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, ChainError> {
        let resp = req.send().await.map_err(|e| {
            ChainError::UpstreamUnavailable(format!("{what}: {}: {e}", self.base_url))
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChainError::UpstreamUnavailable(format!(
                "{what}: {} returned {}",
                self.base_url,
                status.as_u16()
            )));
        }
        Ok(resp)
    }

    async fn json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<T, ChainError> {
        resp.json::<T>()
            .await
            .map_err(|e| ChainError::SerializationError(format!("{what}: {e}")))
    }
}

// =============================================================================
// HOPS
// =============================================================================

/// HTTP client for the hops service.
#[derive(Debug, Clone)]
pub struct HttpHopsApi {
    client: ServiceClient,
}

impl HttpHopsApi {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

impl HopsApi for HttpHopsApi {
    async fn list_hops(&self, attempt_id: &str) -> Result<Vec<Hop>, ChainError> {
        let req = self
            .client
            .request(reqwest::Method::GET, &["hops"])
            .query(&[("attemptId", attempt_id)]);
        let resp = self.client.send(req, "list hops").await?;
        ServiceClient::json(resp, "list hops").await
    }

    async fn create_hop(&self, ids: &AttemptIds, from: &str, to: &str) -> Result<Hop, ChainError> {
        let req = self
            .client
            .request(reqwest::Method::POST, &["hops"])
            .header("x-attempt-id", ids.attempt_id.as_str())
            .header("x-game-id", ids.puzzle_id.as_str())
            .header("x-owner-id", ids.owner_id.as_str())
            .json(&NewHop { from, to });
        let resp = self.client.send(req, "create hop").await?;
        ServiceClient::json(resp, "create hop").await
    }

    async fn delete_hops(&self, attempt_id: &str) -> Result<(), ChainError> {
        let req = self
            .client
            .request(reqwest::Method::DELETE, &["hops"])
            .query(&[("attemptId", attempt_id)]);
        self.client.send(req, "delete hops").await?;
        Ok(())
    }
}

// =============================================================================
// GAMES
// =============================================================================

/// HTTP client for the games service.
#[derive(Debug, Clone)]
pub struct HttpGamesApi {
    client: ServiceClient,
}

impl HttpGamesApi {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

impl GamesApi for HttpGamesApi {
    async fn get_puzzle(&self, puzzle_id: &str) -> Result<Puzzle, ChainError> {
        if matches!(puzzle_id, "." | "..") {
            return Err(ChainError::InvalidPuzzle(format!(
                "puzzle id '{puzzle_id}' is not addressable"
            )));
        }
        let req = self
            .client
            .request(reqwest::Method::GET, &["games", puzzle_id]);
        let resp = self.client.send(req, "get puzzle").await?;
        ServiceClient::json(resp, "get puzzle").await
    }
}

/// Build both collaborator clients from a validated config.
pub fn http_collaborators(config: &Config) -> Result<(HttpHopsApi, HttpGamesApi), ChainError> {
    let hops_url = config
        .hops_api_url
        .as_deref()
        .ok_or_else(|| ChainError::ConfigError("HOPS_API_URL is required".to_string()))?;
    let games_url = config
        .games_api_url
        .as_deref()
        .ok_or_else(|| ChainError::ConfigError("GAMES_API_URL is required".to_string()))?;

    Ok((
        HttpHopsApi::new(ServiceClient::new(hops_url, config)?),
        HttpGamesApi::new(ServiceClient::new(games_url, config)?),
    ))
}

// =============================================================================
// TESTS
// =============================================================================
