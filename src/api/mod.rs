//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod experiment;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod static_files;

pub use dto::{
    ClearedResponse, CreatedResponse, ExperimentResponse, FakeExperimentRequest,
    NewExperimentRequest, SearchParams,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use experiment::{
    clear_experiments, clear_fake_experiments, new_experiment, new_fake_experiment,
    random_experiments, random_fake_experiments,
};
pub use handlers::{AppConfig, AppState, HealthResponse, health_check};
pub use query::{Projection, QueryService, query_fake_by_title, search_fake_by_description};
pub use routes::router;
pub use static_files::{AssetError, CachedAsset, StaticAssets, get_home_page, get_static_file};
