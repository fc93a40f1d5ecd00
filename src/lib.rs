//! Asset Cache - A static file server backed by a bounded in-memory cache
//!
//! File contents are cached under a per-file limit and a global byte budget,
//! and a background scanner keeps them in sync with the filesystem.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
