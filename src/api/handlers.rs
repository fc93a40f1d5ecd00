//! API Handlers
//!
//! HTTP request handlers for static file serving and cache control.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    EnabledResponse, HealthResponse, ScanResponse, SetEnabledRequest, StatsResponse,
};

/// `Last-Modified` header format (RFC 7231 IMF-fixdate)
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared file cache
    pub cache: Arc<CacheStore>,
    /// Directory that `/static` paths resolve against
    pub static_root: Arc<PathBuf>,
}

impl AppState {
    /// Creates a new AppState serving `static_root` through `cache`.
    pub fn new(cache: CacheStore, static_root: impl Into<PathBuf>) -> Self {
        Self {
            cache: Arc::new(cache),
            static_root: Arc::new(static_root.into()),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The cache starts disabled; call `CacheStore::set_enabled` to start it.
    pub fn from_config(config: &Config) -> Self {
        let cache = CacheStore::new(
            config.max_file_size,
            config.max_capacity,
            config.scan_interval(),
        );
        Self::new(cache, config.static_root.clone())
    }
}

/// Handler for GET /static/*path
///
/// Serves a file under the static root through the cache.
pub async fn static_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let relative = sanitize_path(&path)?;
    let full_path = state.static_root.join(&relative);

    let file = state
        .cache
        .lookup(&full_path)
        .await
        .ok_or_else(|| CacheError::NotFound(path.clone()))?;
    debug!(path = %relative.display(), size = file.len(), "Serving static file");

    let content_type = mime_guess::from_path(&relative)
        .first_or_octet_stream()
        .to_string();
    let last_modified = file.meta.modified.format(HTTP_DATE_FORMAT).to_string();

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::LAST_MODIFIED, last_modified),
        ],
        file.content,
    )
        .into_response())
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats().await))
}

/// Handler for POST /cache/scan
///
/// Queues a reconciliation cycle ahead of the timer.
pub async fn scan_handler(State(state): State<AppState>) -> (StatusCode, Json<ScanResponse>) {
    let queued = state.cache.trigger_scan().await;
    let status = if queued {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    (status, Json(ScanResponse::new(queued)))
}

/// Handler for PUT /cache/enabled
///
/// Turns the cache on or off.
pub async fn set_enabled_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetEnabledRequest>, JsonRejection>,
) -> Result<Json<EnabledResponse>> {
    let Json(req) =
        payload.map_err(|rejection| CacheError::InvalidRequest(rejection.body_text()))?;

    state.cache.set_enabled(req.enabled).await;
    Ok(Json(EnabledResponse::new(state.cache.is_enabled())))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.is_enabled()))
}

/// Turns a request path into a relative path that cannot leave the root.
fn sanitize_path(raw: &str) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in FsPath::new(raw).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(CacheError::InvalidPath(raw.to_string())),
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(CacheError::InvalidPath(raw.to_string()));
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_state(root: &FsPath) -> AppState {
        AppState::new(CacheStore::new(500, 1000, Duration::from_secs(3600)), root)
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("css/site.css").unwrap(), PathBuf::from("css/site.css"));
        assert_eq!(sanitize_path("./js/app.js").unwrap(), PathBuf::from("js/app.js"));
        assert!(sanitize_path("../etc/passwd").is_err());
        assert!(sanitize_path("css/../../secret").is_err());
        assert!(sanitize_path("/etc/passwd").is_err());
        assert!(sanitize_path("").is_err());
        assert!(sanitize_path(".").is_err());
    }

    #[tokio::test]
    async fn test_static_handler_serves_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("site.css"), b"h1 { color: red }").unwrap();
        let state = test_state(dir.path());
        state.cache.set_enabled(true).await;

        let response = static_handler(State(state.clone()), Path("site.css".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert!(response.headers()[header::LAST_MODIFIED]
            .to_str()
            .unwrap()
            .ends_with("GMT"));
        assert!(state.cache.contains(dir.path().join("site.css")).await);
        state.cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_static_handler_missing_file() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());

        let result = static_handler(State(state), Path("nope.js".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_static_handler_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());

        let result = static_handler(State(state), Path("../Cargo.toml".to_string())).await;
        assert!(matches!(result, Err(CacheError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_set_enabled_and_scan_handlers() {
        let dir = TempDir::new().unwrap();
        let state = test_state(dir.path());

        let (status, response) = scan_handler(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!response.queued);

        let response = set_enabled_handler(
            State(state.clone()),
            Ok(Json(SetEnabledRequest { enabled: true })),
        )
        .await
        .unwrap();
        assert!(response.enabled);

        let (status, response) = scan_handler(State(state.clone())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(response.queued);

        state.cache.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_handler() {
        let dir = TempDir::new().unwrap();
        let response = health_handler(State(test_state(dir.path()))).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.cache_enabled);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let dir = TempDir::new().unwrap();
        let response = stats_handler(State(test_state(dir.path()))).await;
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.max_capacity, 1000);
    }
}
