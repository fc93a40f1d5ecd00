//! Request and Response models for the static file server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::SetEnabledRequest;
pub use responses::{EnabledResponse, ErrorResponse, HealthResponse, ScanResponse, StatsResponse};
