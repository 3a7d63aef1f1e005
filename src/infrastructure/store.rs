//! Backing stores for persistent collections.
//!
//! A [`CollectionStore`] is the durable side of a
//! [`PersistentCollection`](super::PersistentCollection): it replays stored
//! records once at startup and afterwards only receives appends and clears.
//! Records are never updated in place or removed one by one.

use std::fmt;
use std::hash::Hash;
use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::{Experiment, ExperimentId};

// =============================================================================
// Collection Error
// =============================================================================

/// Errors that can occur during collection and store operations.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// I/O failure of the backing store.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// A record could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored entry could not be decoded while replaying.
    #[error("Corrupt journal entry at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    /// A failed write could not be rolled back; the store refuses appends.
    #[error("Store '{0}' is unavailable after a failed rollback")]
    Poisoned(String),

    /// A blocking store operation did not complete.
    #[error("Store task failed: {0}")]
    Task(String),

    /// A record with the same identifier is already stored.
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// Sampling was requested from a collection holding no records.
    #[error("Collection '{0}' is empty")]
    EmptyCollection(String),
}

// =============================================================================
// Record
// =============================================================================

/// A value that can be stored in a persistent collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type; unique within a collection.
    type Id: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static;

    /// Returns the identifier of this record.
    fn id(&self) -> Self::Id;
}

impl Record for Experiment {
    type Id = ExperimentId;

    fn id(&self) -> ExperimentId {
        self.id
    }
}

// =============================================================================
// Collection Store
// =============================================================================

/// Durable storage for one collection.
///
/// Implementations are only ever driven by a single collection, which
/// serializes calls behind its writer lock.
pub trait CollectionStore<T: Record>: Send + Sync {
    /// Reads every stored record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be read or decoded.
    fn load(&mut self) -> Result<Vec<T>, CollectionError>;

    /// Appends records at the end of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be encoded or written.
    fn append(&mut self, records: &[T]) -> Result<(), CollectionError>;

    /// Removes every stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset cannot be persisted.
    fn clear(&mut self) -> Result<(), CollectionError>;

    /// Short description used in log output.
    fn describe(&self) -> String;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Volatile store; contents are lost when the process exits.
///
/// Used for development and tests where no journal directory is wanted.
#[derive(Debug, Clone)]
pub struct InMemoryStore<T> {
    records: Vec<T>,
}

impl<T> InMemoryStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Creates a store that already holds `records`.
    #[must_use]
    pub const fn with_records(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> CollectionStore<T> for InMemoryStore<T> {
    fn load(&mut self) -> Result<Vec<T>, CollectionError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, records: &[T]) -> Result<(), CollectionError> {
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CollectionError> {
        self.records.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
