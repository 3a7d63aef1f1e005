//! Experiment Catalogue API Library
//!
//! This library provides the core functionality for the experiment catalogue
//! service: durable record collections, fuzzy search and the HTTP surface.

pub mod api;
pub mod domain;
pub mod infrastructure;
