//! Response DTOs for the static file server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Raw cache counters and gauges
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether responses are being cached
    pub cache_enabled: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(cache_enabled: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            cache_enabled,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for a manual scan request (POST /cache/scan)
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    /// Human-readable outcome
    pub message: String,
    /// False when the cache is off or a scan was already pending
    pub queued: bool,
}

impl ScanResponse {
    pub fn new(queued: bool) -> Self {
        let message = if queued {
            "Cache scan queued"
        } else {
            "Cache scan not queued: cache disabled or scan already pending"
        };
        Self {
            message: message.to_string(),
            queued,
        }
    }
}

/// Response body for the cache toggle (PUT /cache/enabled)
#[derive(Debug, Clone, Serialize)]
pub struct EnabledResponse {
    /// Success message
    pub message: String,
    /// Cache state after the request
    pub enabled: bool,
}

impl EnabledResponse {
    pub fn new(enabled: bool) -> Self {
        Self {
            message: format!("Cache {}", if enabled { "enabled" } else { "disabled" }),
            enabled,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
