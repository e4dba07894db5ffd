//! # Service Configuration
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`)
//! 3. Environment variables
//!
//! ## Environment Variables
//!
//! - `HOPS_API_URL`: base URL of the hops collaborator
//! - `GAMES_API_URL`: base URL of the games collaborator
//! - `INTERNAL_SECRET_HEADER_NAME` / `INTERNAL_SECRET_HEADER_VALUE`: header
//!   attached to every collaborator request
//! - `HOPCHAIN_REQUEST_TIMEOUT_MS`: per-request timeout (default: 5000)
//! - `HOPCHAIN_SOLVE_CACHE_CAPACITY`: point cache size (default: 1000)
//! - `HOPCHAIN_QUERY_CACHE_CAPACITY`: query cache size (default: 100)

use hopchain_core::ChainError;
use hopchain_core::primitives::{DEFAULT_QUERY_CACHE_CAPACITY, DEFAULT_SOLVE_CACHE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default timeout for a single collaborator request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Maximum accepted config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hops_api_url: Option<String>,
    pub games_api_url: Option<String>,
    pub secret_header_name: Option<String>,
    pub secret_header_value: Option<String>,
    pub request_timeout_ms: u64,
    pub solve_cache_capacity: usize,
    pub query_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hops_api_url: None,
            games_api_url: None,
            secret_header_name: None,
            secret_header_value: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            solve_cache_capacity: DEFAULT_SOLVE_CACHE_CAPACITY,
            query_cache_capacity: DEFAULT_QUERY_CACHE_CAPACITY,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ChainError> {
    raw.trim()
        .parse()
        .map_err(|_| ChainError::ConfigError(format!("{name} has invalid value '{raw}'")))
}

impl Config {
    /// Load the file (if any), then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ChainError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env(|name| std::env::var(name).ok())
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ChainError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ChainError::ConfigError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ChainError::ConfigError(format!(
                "Config file {} bytes exceeds maximum {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| ChainError::IoError(format!("Read config: {}", e)))?;
        Self::from_toml_str(&text)
    }

    /// Parse TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ChainError> {
        toml::from_str(text).map_err(|e| ChainError::ConfigError(e.to_string()))
    }

    /// Override fields from an environment lookup. Empty values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ChainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HOPS_API_URL") {
            self.hops_api_url = Some(v);
        }
        if let Some(v) = get("GAMES_API_URL") {
            self.games_api_url = Some(v);
        }
        if let Some(v) = get("INTERNAL_SECRET_HEADER_NAME") {
            self.secret_header_name = Some(v);
        }
        if let Some(v) = get("INTERNAL_SECRET_HEADER_VALUE") {
            self.secret_header_value = Some(v);
        }
        if let Some(v) = get("HOPCHAIN_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_env("HOPCHAIN_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("HOPCHAIN_SOLVE_CACHE_CAPACITY") {
            self.solve_cache_capacity = parse_env("HOPCHAIN_SOLVE_CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = get("HOPCHAIN_QUERY_CACHE_CAPACITY") {
            self.query_cache_capacity = parse_env("HOPCHAIN_QUERY_CACHE_CAPACITY", &v)?;
        }

        Ok(self)
    }

    /// Checks that apply to every command.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.request_timeout_ms == 0 {
            return Err(ChainError::ConfigError(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.solve_cache_capacity == 0 || self.query_cache_capacity == 0 {
            return Err(ChainError::ConfigError(
                "cache capacities must be at least 1".to_string(),
            ));
        }
        if self.secret_header_name.is_some() != self.secret_header_value.is_some() {
            return Err(ChainError::ConfigError(
                "INTERNAL_SECRET_HEADER_NAME and INTERNAL_SECRET_HEADER_VALUE must be set together"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Checks for commands that talk to the collaborators.
    pub fn validate_for_server(&self) -> Result<(), ChainError> {
        self.validate()?;
        if self.hops_api_url.is_none() {
            return Err(ChainError::ConfigError("HOPS_API_URL is required".to_string()));
        }
        if self.games_api_url.is_none() {
            return Err(ChainError::ConfigError("GAMES_API_URL is required".to_string()));
        }
        Ok(())
    }

    /// The internal secret header, when both halves are configured.
    pub fn secret_header(&self) -> Option<(&str, &str)> {
        match (&self.secret_header_name, &self.secret_header_value) {
            (Some(name), Some(value)) => Some((name.as_str(), value.as_str())),
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// =============================================================================
// TESTS
// =============================================================================
