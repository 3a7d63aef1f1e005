//! Experiment domain model.
//!
//! Both the real and the fake collection store this record shape; the two
//! variants differ only in how new records are built at the API boundary.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::synthetic::{
    synthetic_description, synthetic_duration, synthetic_salary, synthetic_title,
};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for an experiment.
///
/// This is a newtype wrapper around UUID to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentId(Uuid);

impl ExperimentId {
    /// Generates a new time-ordered identifier (UUID v7).
    ///
    /// **Note**: This is an impure function (side effect: time + random).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for ExperimentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

// =============================================================================
// Experiment Entity
// =============================================================================

/// A single experiment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// Unique identifier, assigned on creation.
    pub id: ExperimentId,
    /// Short title, used by the title search.
    pub title: String,
    /// Free-form description, used by the description search.
    pub description: String,
    /// Cost of running the experiment.
    pub salary: f64,
    /// Duration in days.
    pub duration: u32,
}

impl Experiment {
    /// Creates a new experiment.
    #[must_use]
    pub fn new(
        id: ExperimentId,
        title: impl Into<String>,
        description: impl Into<String>,
        salary: f64,
        duration: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            salary,
            duration,
        }
    }

    /// Builds an experiment whose every field is generated.
    pub fn synthetic<R: Rng + ?Sized>(id: ExperimentId, rng: &mut R) -> Self {
        Self {
            id,
            title: synthetic_title(rng),
            description: synthetic_description(rng),
            salary: synthetic_salary(rng),
            duration: synthetic_duration(rng),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
