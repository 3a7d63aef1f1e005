//! Service configuration and collection factory.
//!
//! This module reads the service configuration from the environment and
//! builds the two experiment collections with the selected backing store.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `file` (default) | `in_memory`
//! - `STORE_DIR`: journal directory (default: `store`)
//! - `SYNC_WRITES`: `true` | `false` (default), fsync after every write
//! - `STATIC_ROOT`: static asset directory (default: `data`)
//! - `HOME_PAGE`: asset served for `/` (default: `home.html`)
//! - `COMPRESSION_MIN_SIZE`: gzip threshold in bytes (default: `1024`)
//! - `MAX_SAMPLE_SIZE`: largest accepted random sample (default: `10000`)
//! - `RNG_SEED`: fixed seed for sampling and synthetic data (default: random)
//!
//! # Example
//!
//! ```ignore
//! let config = ServiceConfig::from_env()?;
//! let collections = CollectionFactory::new(config).create().await?;
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::journal::JOURNAL_EXTENSION;
use super::{
    CollectionError, CollectionStore, InMemoryStore, JournalStore, PersistentCollection,
};
use crate::domain::Experiment;

/// Name of the canonical collection.
pub const REAL_COLLECTION: &str = "real";
/// Name of the synthetic collection.
pub const FAKE_COLLECTION: &str = "fake";

const DEFAULT_STORE_DIR: &str = "store";
const DEFAULT_STATIC_ROOT: &str = "data";
const DEFAULT_HOME_PAGE: &str = "home.html";
const DEFAULT_COMPRESSION_MIN_SIZE: u16 = 1024;
const DEFAULT_MAX_SAMPLE_SIZE: usize = 10_000;

// =============================================================================
// Configuration Types
// =============================================================================

/// Backing store used by the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// JSON-lines journal files; survives restarts.
    #[default]
    File,
    /// Volatile storage for development and tests.
    InMemory,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "file" | "journal" => Ok(Self::File),
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Service configuration.
///
/// Use [`ServiceConfig::builder`] for a fluent API to construct this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Backing store for both collections.
    pub storage_mode: StorageMode,
    /// Directory holding the journal files.
    pub store_dir: PathBuf,
    /// Whether every write is followed by an fsync.
    pub sync_writes: bool,
    /// Root directory of the static front-end bundle.
    pub static_root: PathBuf,
    /// Asset served when no path is given.
    pub home_page: String,
    /// Responses larger than this many bytes are compressed.
    pub compression_min_size: u16,
    /// Largest `n` accepted by the random sampling endpoints.
    pub max_sample_size: usize,
    /// Fixed RNG seed; `None` draws seeds from the operating system.
    pub rng_seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            sync_writes: false,
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            home_page: DEFAULT_HOME_PAGE.to_string(),
            compression_min_size: DEFAULT_COMPRESSION_MIN_SIZE,
            max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
            rng_seed: None,
        }
    }
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();

        let storage_mode = match read_env("STORAGE_MODE")? {
            Some(value) => value.parse()?,
            None => defaults.storage_mode,
        };

        let config = Self {
            storage_mode,
            store_dir: read_env("STORE_DIR")?.map_or(defaults.store_dir, PathBuf::from),
            sync_writes: parse_env("SYNC_WRITES", parse_flag)?.unwrap_or(defaults.sync_writes),
            static_root: read_env("STATIC_ROOT")?.map_or(defaults.static_root, PathBuf::from),
            home_page: read_env("HOME_PAGE")?.unwrap_or(defaults.home_page),
            compression_min_size: parse_env("COMPRESSION_MIN_SIZE", |value| value.parse().ok())?
                .unwrap_or(defaults.compression_min_size),
            max_sample_size: parse_env("MAX_SAMPLE_SIZE", |value| value.parse().ok())?
                .unwrap_or(defaults.max_sample_size),
            rng_seed: parse_env("RNG_SEED", |value| value.parse().ok())?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a path or the home page is empty, or the
    /// sample limit is zero.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::File && self.store_dir.as_os_str().is_empty() {
            return Err(ConfigurationError::EmptyValue("STORE_DIR"));
        }
        if self.static_root.as_os_str().is_empty() {
            return Err(ConfigurationError::EmptyValue("STATIC_ROOT"));
        }
        if self.home_page.trim().is_empty() {
            return Err(ConfigurationError::EmptyValue("HOME_PAGE"));
        }
        if self.max_sample_size == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "MAX_SAMPLE_SIZE",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Reads a variable, treating empty/whitespace-only values as unset.
fn read_env(name: &'static str) -> Result<Option<String>, ConfigurationError> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigurationError::InvalidValue {
            name,
            value: "<non-UTF-8 value>".to_string(),
        }),
    }
}

fn parse_env<T>(
    name: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigurationError> {
    read_env(name)?
        .map(|value| parse(&value).ok_or(ConfigurationError::InvalidValue { name, value }))
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Configuration Builder
// =============================================================================

/// Builder for `ServiceConfig`.
///
/// # Example
///
/// ```
/// use experiment_catalog_api::infrastructure::{ServiceConfig, StorageMode};
///
/// let config = ServiceConfig::builder()
///     .storage_mode(StorageMode::InMemory)
///     .rng_seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.rng_seed, Some(7));
/// ```
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Sets the storage mode.
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.config.storage_mode = mode;
        self
    }

    /// Sets the journal directory.
    #[must_use]
    pub fn store_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.store_dir = directory.into();
        self
    }

    /// Enables or disables fsync after every write.
    #[must_use]
    pub const fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Sets the static asset root.
    #[must_use]
    pub fn static_root(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.static_root = directory.into();
        self
    }

    /// Sets the asset served for `/`.
    #[must_use]
    pub fn home_page(mut self, file: impl Into<String>) -> Self {
        self.config.home_page = file.into();
        self
    }

    /// Sets the compression threshold in bytes.
    #[must_use]
    pub const fn compression_min_size(mut self, bytes: u16) -> Self {
        self.config.compression_min_size = bytes;
        self
    }

    /// Sets the largest accepted random sample.
    #[must_use]
    pub const fn max_sample_size(mut self, size: usize) -> Self {
        self.config.max_sample_size = size;
        self
    }

    /// Fixes the RNG seed.
    #[must_use]
    pub const fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::validate`].
    pub fn build(self) -> Result<ServiceConfig, ConfigurationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading the configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'file' or 'in_memory'")]
    InvalidStorageMode(String),

    /// A variable could not be parsed.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    /// A required value is empty.
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
}

/// Errors that can occur while opening the collections.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A collection could not be opened or seeded.
    #[error("Collection '{name}' failed to open: {source}")]
    Collection {
        name: &'static str,
        #[source]
        source: CollectionError,
    },
}

// =============================================================================
// Collection Factory
// =============================================================================

/// The two experiment collections.
#[derive(Debug, Clone)]
pub struct Collections {
    /// Canonical records.
    pub real: Arc<PersistentCollection<Experiment>>,
    /// Synthetic records, seeded from `real`.
    pub fake: Arc<PersistentCollection<Experiment>>,
}

/// Factory opening the collections for a configuration.
#[derive(Debug, Clone)]
pub struct CollectionFactory {
    config: ServiceConfig,
}

impl CollectionFactory {
    /// Creates a new factory with the given configuration.
    #[must_use]
    pub const fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Opens both collections and seeds the fake one from the real one.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if a journal cannot be opened, replayed or
    /// written during seeding.
    pub async fn create(&self) -> Result<Collections, FactoryError> {
        let real = self.open_collection(REAL_COLLECTION)?;
        let fake = self.open_collection(FAKE_COLLECTION)?;

        fake.extend(&real)
            .await
            .map_err(|source| FactoryError::Collection {
                name: FAKE_COLLECTION,
                source,
            })?;

        Ok(Collections {
            real: Arc::new(real),
            fake: Arc::new(fake),
        })
    }

    fn open_collection(
        &self,
        name: &'static str,
    ) -> Result<PersistentCollection<Experiment>, FactoryError> {
        let store = self
            .create_store(name)
            .map_err(|source| FactoryError::Collection { name, source })?;
        PersistentCollection::open(name, store)
            .map_err(|source| FactoryError::Collection { name, source })
    }

    fn create_store(
        &self,
        name: &str,
    ) -> Result<Box<dyn CollectionStore<Experiment>>, CollectionError> {
        match self.config.storage_mode {
            StorageMode::File => Ok(Box::new(JournalStore::open_in(
                &self.config.store_dir,
                name,
                self.config.sync_writes,
            )?)),
            StorageMode::InMemory => Ok(Box::new(InMemoryStore::new())),
        }
    }

    /// Returns the journal path a collection uses in file mode.
    #[must_use]
    pub fn journal_path(&self, name: &str) -> PathBuf {
        self.config
            .store_dir
            .join(format!("{name}.{JOURNAL_EXTENSION}"))
    }
}

// =============================================================================
// Tests
// =============================================================================
