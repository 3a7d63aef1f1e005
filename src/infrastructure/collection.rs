//! Persistent, append-oriented record collection.
//!
//! A [`PersistentCollection`] keeps the records of one variant in insertion
//! order, mirrors every change into its [`CollectionStore`] and exposes:
//!
//! - lock-free snapshots for readers (`ArcSwap`)
//! - a single async writer lock around append, clear and backfill-then-sample,
//!   so no two requests interleave a read-then-append sequence
//!
//! Store calls do blocking file I/O and run on tokio's blocking pool.
//!
//! Records are never updated or removed individually; only the whole
//! collection can be cleared.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use arc_swap::ArcSwap;
use rand::Rng;
use tokio::sync::Mutex;

use super::store::{CollectionError, CollectionStore, Record};

type SharedStore<T> = Arc<StdMutex<Box<dyn CollectionStore<T>>>>;

/// State owned by the writer lock.
struct Writer<T: Record> {
    store: SharedStore<T>,
    ids: HashSet<T::Id>,
}

/// Runs `operation` against the store on the blocking pool.
async fn run_blocking<T, R, F>(store: &SharedStore<T>, operation: F) -> Result<R, CollectionError>
where
    T: Record,
    R: Send + 'static,
    F: FnOnce(&mut Box<dyn CollectionStore<T>>) -> Result<R, CollectionError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        let mut guard = store
            .lock()
            .map_err(|_| CollectionError::Task("store lock poisoned".to_string()))?;
        operation(&mut guard)
    })
    .await
    .map_err(|error| CollectionError::Task(error.to_string()))?
}

/// Ordered collection of records backed by durable storage.
pub struct PersistentCollection<T: Record> {
    name: String,
    writer: Mutex<Writer<T>>,
    snapshot: ArcSwap<Vec<T>>,
}

impl<T: Record> std::fmt::Debug for PersistentCollection<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PersistentCollection")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<T: Record> PersistentCollection<T> {
    /// Opens a collection, replaying the records already held by `store`.
    ///
    /// If the store holds several records with the same identifier, only the
    /// first one is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be replayed.
    pub fn open(
        name: impl Into<String>,
        mut store: Box<dyn CollectionStore<T>>,
    ) -> Result<Self, CollectionError> {
        let name = name.into();
        let stored = store.load()?;
        let stored_count = stored.len();

        let mut ids = HashSet::with_capacity(stored_count);
        let records: Vec<T> = stored
            .into_iter()
            .filter(|record| ids.insert(record.id()))
            .collect();

        if records.len() != stored_count {
            tracing::warn!(
                collection = %name,
                skipped = stored_count - records.len(),
                "Ignoring stored records with duplicate ids"
            );
        }
        tracing::info!(
            collection = %name,
            store = %store.describe(),
            records = records.len(),
            "Collection opened"
        );

        Ok(Self {
            name,
            writer: Mutex::new(Writer {
                store: Arc::new(StdMutex::new(store)),
                ids,
            }),
            snapshot: ArcSwap::from_pointee(records),
        })
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    /// Returns `true` when the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }

    /// Returns a read-only snapshot of the records in insertion order.
    ///
    /// The snapshot is not affected by later writes.
    #[must_use]
    pub fn list(&self) -> Arc<Vec<T>> {
        self.snapshot.load_full()
    }

    /// Appends a record and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::DuplicateId`] if a record with the same id is
    /// already stored, or a storage error if the write fails.
    pub async fn append(&self, record: T) -> Result<T::Id, CollectionError> {
        let id = record.id();
        let mut writer = self.writer.lock().await;
        if writer.ids.contains(&id) {
            return Err(CollectionError::DuplicateId(id.to_string()));
        }
        self.commit(&mut writer, vec![record]).await?;
        tracing::debug!(collection = %self.name, %id, "Record appended");
        Ok(id)
    }

    /// Removes every record and persists the reset.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the reset cannot be persisted.
    pub async fn clear(&self) -> Result<usize, CollectionError> {
        let mut writer = self.writer.lock().await;
        run_blocking(&writer.store, |store| store.clear()).await?;
        writer.ids.clear();
        let removed = self.snapshot.swap(Arc::new(Vec::new())).len();
        tracing::info!(collection = %self.name, removed, "Collection cleared");
        Ok(removed)
    }

    /// Draws `n` records uniformly at random, with replacement.
    ///
    /// The result has exactly `n` entries and may contain duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyCollection`] if `n > 0` and the
    /// collection holds no records.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<T>, CollectionError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let records = self.snapshot.load();
        if records.is_empty() {
            return Err(CollectionError::EmptyCollection(self.name.clone()));
        }
        Ok((0..n)
            .map(|_| records[rng.random_range(0..records.len())].clone())
            .collect())
    }

    /// Grows the collection to at least `n` records, then samples `n`.
    ///
    /// Missing records are built with `make` and persisted through the normal
    /// append path. The backfill and the sample run under the writer lock.
    /// `n == 0` performs neither.
    ///
    /// # Errors
    ///
    /// Returns an error if a backfilled record cannot be persisted or collides
    /// with an existing id.
    pub async fn backfill_and_sample<R, F>(
        &self,
        n: usize,
        mut make: F,
        rng: &mut R,
    ) -> Result<Vec<T>, CollectionError>
    where
        R: Rng + Send + ?Sized,
        F: FnMut(&mut R) -> T + Send,
    {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut writer = self.writer.lock().await;

        let deficit = n.saturating_sub(self.len());
        if deficit > 0 {
            let mut created = Vec::with_capacity(deficit);
            let mut batch_ids = HashSet::with_capacity(deficit);
            for _ in 0..deficit {
                let record = make(rng);
                let id = record.id();
                if writer.ids.contains(&id) || !batch_ids.insert(id.clone()) {
                    return Err(CollectionError::DuplicateId(id.to_string()));
                }
                created.push(record);
            }
            self.commit(&mut writer, created).await?;
            tracing::info!(collection = %self.name, backfilled = deficit, "Collection backfilled");
        }

        self.sample(n, rng)
    }

    /// Copies every current record of `other` that is not already present.
    ///
    /// This is a one-shot copy, not a live sync. Returns the number of records
    /// copied.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the copied records cannot be persisted.
    pub async fn extend(&self, other: &Self) -> Result<usize, CollectionError> {
        let source = other.list();
        let mut writer = self.writer.lock().await;

        let mut seen = HashSet::new();
        let missing: Vec<T> = source
            .iter()
            .filter(|record| {
                let id = record.id();
                !writer.ids.contains(&id) && seen.insert(id)
            })
            .cloned()
            .collect();

        let copied = missing.len();
        self.commit(&mut writer, missing).await?;
        tracing::info!(
            collection = %self.name,
            source = %other.name,
            copied,
            "Collection extended"
        );
        Ok(copied)
    }

    /// Persists `records`, then publishes them to readers.
    async fn commit(&self, writer: &mut Writer<T>, records: Vec<T>) -> Result<(), CollectionError> {
        if records.is_empty() {
            return Ok(());
        }
        let records = run_blocking(&writer.store, move |store| {
            store.append(&records)?;
            Ok(records)
        })
        .await?;
        writer.ids.extend(records.iter().map(Record::id));

        let current = self.snapshot.load();
        let mut next = Vec::with_capacity(current.len() + records.len());
        next.extend_from_slice(&current);
        next.extend(records);
        self.snapshot.store(Arc::new(next));
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
