//! Infrastructure module for storage and external collaborators.
//!
//! This module contains the persistent collections and their backing stores,
//! the fuzzy matcher adapter, the randomness source and the factory that
//! wires them from configuration.

pub mod collection;
pub mod factory;
pub mod journal;
pub mod matcher;
pub mod rng;
pub mod store;

pub use collection::PersistentCollection;
pub use factory::{
    CollectionFactory, Collections, ConfigurationError, FAKE_COLLECTION, FactoryError,
    REAL_COLLECTION, ServiceConfig, ServiceConfigBuilder, StorageMode,
};
pub use journal::JournalStore;
pub use matcher::{FuzzyMatcher, NucleoMatcher, ScoredMatch};
pub use rng::RngProvider;
pub use store::{CollectionError, CollectionStore, InMemoryStore, Record};
