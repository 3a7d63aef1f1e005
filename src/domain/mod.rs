//! Domain module for the experiment catalogue.
//!
//! This module contains the experiment record, the closed set of result
//! orderings and the synthetic data generators used by the fake collection.

pub mod experiment;
pub mod sorting;
pub mod synthetic;

pub use experiment::{Experiment, ExperimentId};
pub use sorting::Sorting;
pub use synthetic::{synthetic_description, synthetic_duration, synthetic_salary, synthetic_title};
