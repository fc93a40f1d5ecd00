//! API Module
//!
//! HTTP handlers and routing for the static file server.
//!
//! # Endpoints
//! - `GET /static/*path` - Serve a file from the static root through the cache
//! - `GET /stats` - Get cache statistics
//! - `POST /cache/scan` - Queue a reconciliation scan
//! - `PUT /cache/enabled` - Turn the cache on or off
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
