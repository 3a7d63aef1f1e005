//! Router construction.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, Predicate, SizeAbove};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::experiment::{
    clear_experiments, clear_fake_experiments, new_experiment, new_fake_experiment,
    random_experiments, random_fake_experiments,
};
use super::handlers::{AppState, health_check};
use super::query::{query_fake_by_title, search_fake_by_description};
use super::static_files::{get_home_page, get_static_file};

/// Builds the application router with its middleware stack.
///
/// Experiment routes live under `/experiment`; every other `GET` falls
/// through to the static bundle.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).compress_when(
        DefaultPredicate::new().and(SizeAbove::new(state.config.compression_min_size)),
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/experiment/query/fake/{text}", get(query_fake_by_title))
        .route(
            "/experiment/search/fake/{text}",
            get(search_fake_by_description),
        )
        .route("/experiment/new/fake", post(new_fake_experiment))
        .route("/experiment/fake", delete(clear_fake_experiments))
        .route("/experiment/fake/random/{n}", get(random_fake_experiments))
        .route("/experiment/new", post(new_experiment))
        .route("/experiment/", delete(clear_experiments))
        .route("/experiment/random/{n}", get(random_experiments))
        .route("/", get(get_home_page))
        .route("/{*file}", get(get_static_file))
        .layer(compression)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
