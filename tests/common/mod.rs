//! Common test helpers for integration tests.
//!
//! This module provides shared utilities for creating `AppState` instances,
//! driving the router and building test data.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every
//! helper.

#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use experiment_catalog_api::api::{AppState, router};
use experiment_catalog_api::domain::{Experiment, ExperimentId};
use experiment_catalog_api::infrastructure::{CollectionFactory, ServiceConfig, StorageMode};

/// Seed used by every test state, so sampling is reproducible.
pub const TEST_SEED: u64 = 42;

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates a test configuration with in-memory collections.
pub fn in_memory_config() -> ServiceConfig {
    ServiceConfig::builder()
        .storage_mode(StorageMode::InMemory)
        .rng_seed(TEST_SEED)
        .build()
        .expect("valid test configuration")
}

/// Creates a test `AppState` with in-memory collections.
pub async fn create_test_app_state() -> AppState {
    create_app_state(in_memory_config()).await
}

/// Creates an `AppState` for the given configuration.
pub async fn create_app_state(config: ServiceConfig) -> AppState {
    let collections = CollectionFactory::new(config.clone())
        .create()
        .await
        .expect("Failed to open collections");
    AppState::new(collections, &config)
}

/// Creates a journal-backed configuration inside `store_dir`.
pub fn file_config(store_dir: &Path) -> ServiceConfig {
    ServiceConfig::builder()
        .storage_mode(StorageMode::File)
        .store_dir(store_dir)
        .rng_seed(TEST_SEED)
        .build()
        .expect("valid test configuration")
}

// =============================================================================
// Test Data Helpers
// =============================================================================

/// Builds an experiment with a fresh id.
pub fn experiment(title: &str, description: &str, salary: f64, duration: u32) -> Experiment {
    Experiment::new(ExperimentId::generate(), title, description, salary, duration)
}

/// Appends experiments to the fake collection.
pub async fn seed_fake(state: &AppState, experiments: Vec<Experiment>) {
    for experiment in experiments {
        state
            .fake_experiments
            .append(experiment)
            .await
            .expect("Failed to append fake experiment");
    }
}

/// Appends experiments to the real collection.
pub async fn seed_real(state: &AppState, experiments: Vec<Experiment>) {
    for experiment in experiments {
        state
            .real_experiments
            .append(experiment)
            .await
            .expect("Failed to append experiment");
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Builds the full application router.
pub fn test_router(state: AppState) -> Router {
    router(state)
}

/// Sends one request through the router.
pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

/// Sends a `GET` request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::get(uri).body(Body::empty()).expect("valid request"),
    )
    .await
}

/// Sends a JSON `POST` request.
pub async fn post_json(app: Router, uri: &str, body: &serde_json::Value) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
    )
    .await
}

/// Sends a `DELETE` request.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::delete(uri).body(Body::empty()).expect("valid request"),
    )
    .await
}

/// Collects a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes()
        .to_vec()
}

/// Collects and deserializes a JSON response body.
pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Response body is not the expected JSON")
}
