//! # API Request/Response Types
//!
//! Envelope fields are snake_case; the records inside (`AttemptOutcome`,
//! `Solve`, batch items) keep their camelCase wire names.

use crate::engine::{BatchRecord, BatchReport};
use hopchain_core::{AttemptOutcome, CacheStats, ChainError, Solve};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Cache counters as exposed over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsJson {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: u8,
}

impl From<CacheStats> for CacheStatsJson {
    fn from(s: CacheStats) -> Self {
        Self {
            size: s.size,
            max_size: s.max_size,
            hits: s.hits,
            misses: s.misses,
            hit_rate_percent: s.hit_rate_percent,
        }
    }
}

/// Service status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub backend: String,
    pub solve_count: usize,
    pub solve_cache: CacheStatsJson,
    pub query_cache: CacheStatsJson,
}

// =============================================================================
// HOP ATTEMPT
// =============================================================================

/// Body of `POST /attempt/hop`. Identity travels in headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopRequest {
    pub word: String,
}

/// Hop attempt response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AttemptOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl HopResponse {
    pub fn success(outcome: AttemptOutcome) -> Self {
        Self {
            success: true,
            outcome: Some(outcome),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(err: &ChainError) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
        }
    }
}

// =============================================================================
// SOLVE READS
// =============================================================================

/// Single solve lookup response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solve: Option<Solve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolveResponse {
    pub fn found(solve: Solve) -> Self {
        Self {
            found: true,
            solve: Some(solve),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            solve: None,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            found: false,
            solve: None,
            error: Some(msg.into()),
        }
    }
}

/// Solve query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvesResponse {
    pub success: bool,
    pub count: usize,
    pub solves: Vec<Solve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolvesResponse {
    pub fn with_solves(solves: Vec<Solve>) -> Self {
        Self {
            success: true,
            count: solves.len(),
            solves,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            solves: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// BATCH
// =============================================================================

/// Body of `POST /solves/batch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub records: Vec<BatchRecord>,
}

/// Batch finalization response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    /// `success` is true only when every record was committed.
    pub fn from_report(report: BatchReport) -> Self {
        Self {
            success: report.failed == 0,
            report: Some(report),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(msg.into()),
        }
    }
}
