//! Create, clear and sample handlers for both experiment collections.
//!
//! # Endpoints
//!
//! - `POST /experiment/new/fake` - Create a fake experiment
//! - `DELETE /experiment/fake` - Clear fake experiments
//! - `GET /experiment/fake/random/{n}` - Backfill, then sample fake experiments
//! - `POST /experiment/new` - Create a real experiment
//! - `DELETE /experiment/` - Clear real experiments
//! - `GET /experiment/random/{n}` - Sample real experiments
//!
//! Random samples are drawn with replacement and always hold exactly `n`
//! experiments; `n <= 0` returns an empty list.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::dto::{
    ClearedResponse, CreatedResponse, ExperimentResponse, FakeExperimentRequest,
    NewExperimentRequest,
};
use super::error::{ApiErrorResponse, ValidationError};
use super::handlers::AppState;
use crate::domain::{Experiment, ExperimentId};

// =============================================================================
// POST /experiment/new/fake
// =============================================================================

/// Creates a fake experiment.
///
/// Fields omitted from the body are filled with synthetic values.
///
/// # Response
///
/// - **201 Created**: `{"id": "..."}`
/// - **400 Bad Request**: A provided field is invalid
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on validation failure (400) or when the
/// record cannot be persisted (500).
pub async fn new_fake_experiment(
    State(state): State<AppState>,
    Json(request): Json<FakeExperimentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiErrorResponse> {
    let experiment = {
        let mut rng = state.rng_provider.for_operation("fake.new");
        request.into_experiment(ExperimentId::generate(), &mut rng)?
    };

    let id = state.fake_experiments.append(experiment).await?;
    tracing::info!(%id, "Fake experiment created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: id.to_string() }),
    ))
}

// =============================================================================
// DELETE /experiment/fake
// =============================================================================

/// Removes every fake experiment.
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] (500) if the reset cannot be persisted.
pub async fn clear_fake_experiments(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, ApiErrorResponse> {
    let removed = state.fake_experiments.clear().await?;
    Ok(Json(ClearedResponse { removed }))
}

// =============================================================================
// GET /experiment/fake/random/{n}
// =============================================================================

/// Returns `n` random fake experiments.
///
/// When fewer than `n` fake experiments exist, synthetic ones are created
/// and persisted first, so the request never fails for lack of records.
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] if `n` exceeds the configured maximum (400)
/// or backfilled records cannot be persisted (500).
pub async fn random_fake_experiments(
    State(state): State<AppState>,
    Path(n): Path<i64>,
) -> Result<Json<Vec<ExperimentResponse>>, ApiErrorResponse> {
    let n = sample_size(n, state.config.max_sample_size)?;
    let mut rng = state.rng_provider.for_operation("fake.random");

    let sampled = state
        .fake_experiments
        .backfill_and_sample(
            n,
            |rng| Experiment::synthetic(ExperimentId::generate(), rng),
            &mut rng,
        )
        .await?;

    tracing::debug!(n, total = state.fake_experiments.len(), "Fake experiments sampled");
    Ok(Json(sampled.iter().map(ExperimentResponse::from).collect()))
}

// =============================================================================
// POST /experiment/new
// =============================================================================

/// Creates a real experiment.
///
/// # Response
///
/// - **201 Created**: `{"id": "..."}`
/// - **400 Bad Request**: Blank title or invalid salary
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] on validation failure (400) or when the
/// record cannot be persisted (500).
pub async fn new_experiment(
    State(state): State<AppState>,
    Json(request): Json<NewExperimentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiErrorResponse> {
    let experiment = request.into_experiment(ExperimentId::generate())?;

    let id = state.real_experiments.append(experiment).await?;
    tracing::info!(%id, "Experiment created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: id.to_string() }),
    ))
}

// =============================================================================
// DELETE /experiment/
// =============================================================================

/// Removes every real experiment.
///
/// Fake experiments seeded from them are kept.
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] (500) if the reset cannot be persisted.
pub async fn clear_experiments(
    State(state): State<AppState>,
) -> Result<Json<ClearedResponse>, ApiErrorResponse> {
    let removed = state.real_experiments.clear().await?;
    Ok(Json(ClearedResponse { removed }))
}

// =============================================================================
// GET /experiment/random/{n}
// =============================================================================

/// Returns `n` random real experiments.
///
/// # Errors
///
/// Returns [`ApiErrorResponse`] if `n` exceeds the configured maximum (400)
/// or the collection is empty and `n > 0` (409).
pub async fn random_experiments(
    State(state): State<AppState>,
    Path(n): Path<i64>,
) -> Result<Json<Vec<ExperimentResponse>>, ApiErrorResponse> {
    let n = sample_size(n, state.config.max_sample_size)?;
    let mut rng = state.rng_provider.for_operation("real.random");

    let sampled = state.real_experiments.sample(n, &mut rng)?;

    tracing::debug!(n, total = state.real_experiments.len(), "Experiments sampled");
    Ok(Json(sampled.iter().map(ExperimentResponse::from).collect()))
}

/// Converts a requested sample size, mapping non-positive values to zero.
fn sample_size(n: i64, max_sample_size: usize) -> Result<usize, ValidationError> {
    let size = usize::try_from(n).unwrap_or(0);
    if size > max_sample_size {
        return Err(ValidationError::single(
            "n",
            format!("Sample size must not exceed {max_sample_size}"),
        ));
    }
    Ok(size)
}

// =============================================================================
// Tests
// =============================================================================
