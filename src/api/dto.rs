//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{
    Experiment, ExperimentId, Sorting, synthetic_description, synthetic_duration,
    synthetic_salary, synthetic_title,
};

/// Number of results returned by the search endpoints when `n` is omitted.
pub const DEFAULT_RESULT_COUNT: i64 = 3;

// =============================================================================
// Experiment DTOs
// =============================================================================

/// Request DTO for creating a real experiment. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExperimentRequest {
    /// Title of the experiment.
    pub title: String,
    /// Description of the experiment.
    pub description: String,
    /// Cost of running the experiment.
    pub salary: f64,
    /// Duration in days.
    pub duration: u32,
}

impl NewExperimentRequest {
    /// Validates the request and builds the experiment with the given id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the title is blank or the salary is
    /// negative or not finite.
    pub fn into_experiment(self, id: ExperimentId) -> Result<Experiment, ValidationError> {
        let errors: Vec<FieldError> = [validate_title(&self.title), validate_salary(self.salary)]
            .into_iter()
            .flatten()
            .collect();
        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(Experiment::new(
            id,
            self.title.trim(),
            self.description,
            self.salary,
            self.duration,
        ))
    }
}

/// Request DTO for creating a fake experiment.
///
/// Omitted fields are filled with synthetic values, so `{}` is a valid body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakeExperimentRequest {
    /// Title of the experiment.
    #[serde(default)]
    pub title: Option<String>,
    /// Description of the experiment.
    #[serde(default)]
    pub description: Option<String>,
    /// Cost of running the experiment.
    #[serde(default)]
    pub salary: Option<f64>,
    /// Duration in days.
    #[serde(default)]
    pub duration: Option<u32>,
}

impl FakeExperimentRequest {
    /// Validates the provided fields and fills the others from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a provided title is blank or a provided
    /// salary is negative or not finite.
    pub fn into_experiment<R: Rng + ?Sized>(
        self,
        id: ExperimentId,
        rng: &mut R,
    ) -> Result<Experiment, ValidationError> {
        let errors: Vec<FieldError> = [
            self.title.as_deref().and_then(validate_title),
            self.salary.and_then(validate_salary),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !errors.is_empty() {
            return Err(ValidationError::new(errors));
        }

        Ok(Experiment::new(
            id,
            self.title
                .map_or_else(|| synthetic_title(rng), |title| title.trim().to_string()),
            self.description
                .unwrap_or_else(|| synthetic_description(rng)),
            self.salary.unwrap_or_else(|| synthetic_salary(rng)),
            self.duration.unwrap_or_else(|| synthetic_duration(rng)),
        ))
    }
}

/// Response DTO for an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResponse {
    /// Experiment ID.
    pub id: String,
    /// Title of the experiment.
    pub title: String,
    /// Description of the experiment.
    pub description: String,
    /// Cost of running the experiment.
    pub salary: f64,
    /// Duration in days.
    pub duration: u32,
}

impl From<&Experiment> for ExperimentResponse {
    fn from(experiment: &Experiment) -> Self {
        Self {
            id: experiment.id.to_string(),
            title: experiment.title.clone(),
            description: experiment.description.clone(),
            salary: experiment.salary,
            duration: experiment.duration,
        }
    }
}

impl From<Experiment> for ExperimentResponse {
    fn from(experiment: Experiment) -> Self {
        Self::from(&experiment)
    }
}

/// Response DTO for a created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// Identifier assigned to the new record.
    pub id: String,
}

/// Response DTO for a cleared collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedResponse {
    /// Number of records removed.
    pub removed: usize,
}

// =============================================================================
// Query DTOs
// =============================================================================

/// Query parameters of the fuzzy search endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchParams {
    /// Maximum number of results; zero or negative yields no results.
    #[serde(default = "default_result_count")]
    pub n: i64,
    /// Ordering applied to the matches.
    #[serde(default)]
    pub key: Sorting,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            n: DEFAULT_RESULT_COUNT,
            key: Sorting::default(),
        }
    }
}

impl SearchParams {
    /// Returns `n` as a result limit, mapping non-positive values to zero.
    #[must_use]
    pub fn limit(&self) -> usize {
        usize::try_from(self.n).unwrap_or(0)
    }
}

const fn default_result_count() -> i64 {
    DEFAULT_RESULT_COUNT
}

// =============================================================================
// Validation Functions
// =============================================================================

/// Validates an experiment title.
pub fn validate_title(title: &str) -> Option<FieldError> {
    title
        .trim()
        .is_empty()
        .then(|| FieldError::new("title", "Title must not be blank"))
}

/// Validates an experiment salary.
pub fn validate_salary(salary: f64) -> Option<FieldError> {
    if !salary.is_finite() {
        Some(FieldError::new("salary", "Salary must be a finite number"))
    } else if salary < 0.0 {
        Some(FieldError::new("salary", "Salary must not be negative"))
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
