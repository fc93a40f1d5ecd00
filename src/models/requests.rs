//! Request DTOs for the static file server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for toggling the cache (PUT /cache/enabled)
///
/// # Fields
/// - `enabled`: `true` to start caching, `false` to serve from disk
#[derive(Debug, Clone, Deserialize)]
pub struct SetEnabledRequest {
    /// Desired cache state
    pub enabled: bool,
}
