//! Application state and service-level handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::query::QueryService;
use super::static_files::StaticAssets;
use crate::domain::Experiment;
use crate::infrastructure::{Collections, PersistentCollection, RngProvider, ServiceConfig};

// =============================================================================
// Application Configuration
// =============================================================================

/// Request-time settings taken from [`ServiceConfig`].
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Largest `n` accepted by the random sampling endpoints.
    pub max_sample_size: usize,
    /// Responses larger than this many bytes are gzip-compressed.
    pub compression_min_size: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for AppConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            max_sample_size: config.max_sample_size,
            compression_min_size: config.compression_min_size,
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Both collections are opened once by the startup routine and shared by
/// every request; nothing here is a process-wide global.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Canonical experiments.
    pub real_experiments: Arc<PersistentCollection<Experiment>>,
    /// Synthetic experiments, seeded from the real ones at startup.
    pub fake_experiments: Arc<PersistentCollection<Experiment>>,
    /// Fuzzy search over the fake experiments.
    pub query_service: QueryService,
    /// Static front-end bundle.
    pub static_assets: Arc<StaticAssets>,
    /// Source of randomness for sampling and synthetic records.
    pub rng_provider: Arc<RngProvider>,
    /// Request-time settings.
    pub config: AppConfig,
}

impl AppState {
    /// Creates the state from opened collections and the service configuration.
    #[must_use]
    pub fn new(collections: Collections, config: &ServiceConfig) -> Self {
        Self {
            real_experiments: collections.real,
            fake_experiments: collections.fake,
            query_service: QueryService::default(),
            static_assets: Arc::new(StaticAssets::new(
                config.static_root.clone(),
                config.home_page.clone(),
            )),
            rng_provider: Arc::new(RngProvider::from_seed(config.rng_seed)),
            config: AppConfig::from(config),
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Number of real experiments.
    pub real_experiments: usize,
    /// Number of fake experiments.
    pub fake_experiments: usize,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "real_experiments": 2,
///   "fake_experiments": 10
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        real_experiments: state.real_experiments.len(),
        fake_experiments: state.fake_experiments.len(),
    })
}

// =============================================================================
// Tests
// =============================================================================
