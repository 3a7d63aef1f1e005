//! Static front-end bundle.
//!
//! Files are read from a fixed root directory and kept in memory for the
//! lifetime of the process, keyed by the requested path. Missing files are
//! not cached, so a file added later is served once it exists.

use std::io::ErrorKind;
use std::path::{Component, Path as FilePath, PathBuf};

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use tokio::sync::Mutex;

use super::error::ApiErrorResponse;
use super::handlers::AppState;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while serving an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The path escapes the asset root or is otherwise unusable.
    #[error("Invalid asset path: '{0}'")]
    InvalidPath(String),

    /// No file exists at the path.
    #[error("Asset not found: '{0}'")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("Failed to read asset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Asset Cache
// =============================================================================

/// A file held in memory.
#[derive(Debug, Clone)]
pub struct CachedAsset {
    /// Value of the `Content-Type` header.
    pub content_type: &'static str,
    /// File contents.
    pub body: Bytes,
}

impl IntoResponse for CachedAsset {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// File server over a fixed root with a process-lifetime cache.
#[derive(Debug)]
pub struct StaticAssets {
    root: PathBuf,
    home_page: String,
    cache: Mutex<LruCache<String, CachedAsset>>,
}

impl StaticAssets {
    /// Creates a server for `root`, answering `/` with `home_page`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, home_page: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            home_page: home_page.into(),
            cache: Mutex::new(LruCache::unbounded()),
        }
    }

    /// Returns the asset root.
    #[must_use]
    pub fn root(&self) -> &FilePath {
        &self.root
    }

    /// Returns the number of cached assets.
    pub async fn cached_count(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Returns the home page.
    ///
    /// # Errors
    ///
    /// See [`StaticAssets::get`].
    pub async fn home(&self) -> Result<CachedAsset, AssetError> {
        self.get(&self.home_page).await
    }

    /// Returns the asset at `requested`, relative to the root.
    ///
    /// An empty path resolves to the home page.
    ///
    /// # Errors
    ///
    /// - `AssetError::InvalidPath` for absolute paths or paths with `..`
    /// - `AssetError::NotFound` if no file exists at the path
    /// - `AssetError::Io` if the file cannot be read
    pub async fn get(&self, requested: &str) -> Result<CachedAsset, AssetError> {
        let requested = if requested.is_empty() {
            self.home_page.as_str()
        } else {
            requested
        };

        if let Some(asset) = self.cache.lock().await.get(requested) {
            tracing::debug!(path = requested, "Static asset cache hit");
            return Ok(asset.clone());
        }

        let relative = sanitize(requested)?;
        let full_path = self.root.join(&relative);
        let body = match tokio::fs::read(&full_path).await {
            Ok(contents) => Bytes::from(contents),
            Err(error) if matches!(error.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                return Err(AssetError::NotFound(requested.to_string()));
            }
            Err(source) => {
                return Err(AssetError::Io {
                    path: requested.to_string(),
                    source,
                });
            }
        };

        let asset = CachedAsset {
            content_type: content_type_for(&relative),
            body,
        };
        tracing::debug!(
            path = requested,
            bytes = asset.body.len(),
            "Static asset loaded"
        );
        self.cache
            .lock()
            .await
            .put(requested.to_string(), asset.clone());
        Ok(asset)
    }
}

/// Accepts only plain relative paths below the root.
fn sanitize(requested: &str) -> Result<PathBuf, AssetError> {
    let path = FilePath::new(requested);
    let mut relative = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(AssetError::InvalidPath(requested.to_string()));
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(AssetError::InvalidPath(requested.to_string()));
    }
    Ok(relative)
}

fn content_type_for(path: &FilePath) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// GET / and GET /{*file}
// =============================================================================

/// Serves the home page.
///
/// # Errors
///
/// - **404 Not Found**: The home page does not exist
/// - **500 Internal Server Error**: The file cannot be read
pub async fn get_home_page(
    State(state): State<AppState>,
) -> Result<CachedAsset, ApiErrorResponse> {
    Ok(state.static_assets.home().await?)
}

/// Serves a file of the static bundle.
///
/// # Errors
///
/// - **400 Bad Request**: The path is absolute or contains `..`
/// - **404 Not Found**: No such file
/// - **500 Internal Server Error**: The file cannot be read
pub async fn get_static_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<CachedAsset, ApiErrorResponse> {
    Ok(state.static_assets.get(&file).await?)
}

// =============================================================================
// Tests
// =============================================================================
