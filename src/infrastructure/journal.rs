//! Append-only JSON-lines journal backing a collection.
//!
//! Every record is written as one line of compact JSON terminated by `\n`.
//! Clearing the collection truncates the file.
//!
//! # Recovery
//!
//! On replay, a final line that fails to decode is treated as a torn write
//! from an interrupted append: it is dropped and the file is truncated back to
//! the last complete record so later appends start on a clean line. A line
//! that fails to decode anywhere else is reported as
//! [`CollectionError::Corrupt`].
//!
//! A failed append is rolled back to the previous file length, so a partial
//! write never merges with the next record. If the rollback itself fails the
//! store refuses further appends until it is cleared.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::store::{CollectionError, CollectionStore, Record};

/// File extension used for journal files.
pub const JOURNAL_EXTENSION: &str = "jsonl";

/// Journal file store.
#[derive(Debug)]
pub struct JournalStore {
    path: PathBuf,
    file: File,
    sync: bool,
    poisoned: bool,
}

impl JournalStore {
    /// Opens (creating if needed) the journal at `path`.
    ///
    /// With `sync` set, every write is followed by `sync_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or the file cannot be created.
    pub fn open<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, CollectionError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;
        Ok(Self {
            path,
            file,
            sync,
            poisoned: false,
        })
    }

    /// Opens the journal for the collection `name` inside `directory`.
    ///
    /// # Errors
    ///
    /// See [`JournalStore::open`].
    pub fn open_in<P: AsRef<Path>>(
        directory: P,
        name: &str,
        sync: bool,
    ) -> Result<Self, CollectionError> {
        Self::open(
            directory
                .as_ref()
                .join(format!("{name}.{JOURNAL_EXTENSION}")),
            sync,
        )
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&mut self) -> Result<(), CollectionError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Writes `bytes` at the end of the journal with `write`.
    ///
    /// On failure the file is truncated back to its length before the call.
    fn append_with<W>(&mut self, bytes: &[u8], write: W) -> Result<(), CollectionError>
    where
        W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        if self.poisoned {
            return Err(CollectionError::Poisoned(self.path.display().to_string()));
        }
        let previous_len = self.file.metadata()?.len();

        let result = write(&mut self.file, bytes)
            .map_err(CollectionError::from)
            .and_then(|()| self.flush());
        if let Err(error) = result {
            if let Err(rollback) = self.file.set_len(previous_len) {
                tracing::error!(
                    path = %self.path.display(),
                    %error,
                    %rollback,
                    "Journal rollback failed, refusing further appends"
                );
                self.poisoned = true;
            } else {
                tracing::warn!(path = %self.path.display(), %error, "Journal append rolled back");
            }
            return Err(error);
        }
        Ok(())
    }
}

/// Outcome of reading a journal from the start.
#[derive(Debug)]
struct Replay<T> {
    records: Vec<T>,
    /// Length in bytes of the valid prefix.
    valid_len: u64,
    /// The valid prefix ends without a line terminator.
    missing_newline: bool,
    torn_tail: bool,
}

fn replay<T: Record, R: BufRead>(mut reader: R) -> Result<Replay<T>, CollectionError> {
    let mut records = Vec::new();
    let mut valid_len = 0u64;
    let mut missing_newline = false;
    let mut torn_tail = false;
    let mut line_number = 0usize;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let complete = line.last() == Some(&b'\n');
        let content = line.trim_ascii();
        if content.is_empty() {
            valid_len += read as u64;
            continue;
        }

        match serde_json::from_slice::<T>(content) {
            Ok(record) => {
                records.push(record);
                valid_len += read as u64;
                missing_newline = !complete;
            }
            Err(error) => {
                if reader.fill_buf()?.is_empty() {
                    tracing::warn!(
                        line = line_number,
                        %error,
                        "Dropping torn trailing journal entry"
                    );
                    torn_tail = true;
                    break;
                }
                return Err(CollectionError::Corrupt {
                    line: line_number,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(Replay {
        records,
        valid_len,
        missing_newline,
        torn_tail,
    })
}

impl<T: Record> CollectionStore<T> for JournalStore {
    fn load(&mut self) -> Result<Vec<T>, CollectionError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let replayed = replay::<T, _>(reader)?;

        if replayed.torn_tail {
            self.file.set_len(replayed.valid_len)?;
        }
        if replayed.missing_newline {
            self.file.write_all(b"\n")?;
        }
        if replayed.torn_tail || replayed.missing_newline {
            self.flush()?;
        }

        tracing::debug!(
            path = %self.path.display(),
            records = replayed.records.len(),
            "Journal replayed"
        );
        Ok(replayed.records)
    }

    fn append(&mut self, records: &[T]) -> Result<(), CollectionError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        self.append_with(&buffer, |file, bytes| file.write_all(bytes))
    }

    fn clear(&mut self) -> Result<(), CollectionError> {
        self.file.set_len(0)?;
        self.flush()?;
        self.poisoned = false;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("journal:{}", self.path.display())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Experiment, ExperimentId};
    use rstest::rstest;
    use tempfile::tempdir;

    fn experiment(title: &str) -> Experiment {
        Experiment::new(ExperimentId::generate(), title, "desc", 10.0, 2)
    }

    fn load(store: &mut JournalStore) -> Vec<Experiment> {
        CollectionStore::<Experiment>::load(store).unwrap()
    }

    #[rstest]
    fn test_journal_write_and_replay() {
        let directory = tempdir().unwrap();
        let records = vec![experiment("a"), experiment("b"), experiment("c")];

        {
            let mut store = JournalStore::open_in(directory.path(), "real", true).unwrap();
            store.append(&records[..2]).unwrap();
            store.append(&records[2..]).unwrap();
        }

        let mut reopened = JournalStore::open_in(directory.path(), "real", true).unwrap();
        assert_eq!(load(&mut reopened), records);
    }

    #[rstest]
    fn test_journal_open_creates_directory() {
        let directory = tempdir().unwrap();
        let nested = directory.path().join("nested").join("store");

        let store = JournalStore::open_in(&nested, "fake", false).unwrap();

        assert!(store.path().exists());
        assert_eq!(store.path(), nested.join("fake.jsonl"));
    }

    #[rstest]
    fn test_journal_clear_truncates() {
        let directory = tempdir().unwrap();
        let mut store = JournalStore::open_in(directory.path(), "real", false).unwrap();
        store.append(&[experiment("a")]).unwrap();

        CollectionStore::<Experiment>::clear(&mut store).unwrap();

        assert_eq!(fs::metadata(store.path()).unwrap().len(), 0);
        assert!(load(&mut store).is_empty());
    }

    #[rstest]
    fn test_journal_append_after_clear() {
        let directory = tempdir().unwrap();
        let mut store = JournalStore::open_in(directory.path(), "real", false).unwrap();
        store.append(&[experiment("a")]).unwrap();
        CollectionStore::<Experiment>::clear(&mut store).unwrap();

        let survivor = experiment("b");
        store.append(std::slice::from_ref(&survivor)).unwrap();

        assert_eq!(load(&mut store), vec![survivor]);
    }

    #[rstest]
    fn test_journal_drops_torn_tail_and_recovers() {
        let directory = tempdir().unwrap();
        let kept = experiment("kept");
        let path = {
            let mut store = JournalStore::open_in(directory.path(), "fake", false).unwrap();
            store.append(std::slice::from_ref(&kept)).unwrap();
            store.path().to_path_buf()
        };
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":\"0190").unwrap();
        drop(file);

        let mut store = JournalStore::open(&path, false).unwrap();
        assert_eq!(load(&mut store), vec![kept.clone()]);

        let next = experiment("next");
        store.append(std::slice::from_ref(&next)).unwrap();

        let mut reopened = JournalStore::open(&path, false).unwrap();
        assert_eq!(load(&mut reopened), vec![kept, next]);
    }

    #[rstest]
    fn test_journal_failed_append_does_not_swallow_next_record() {
        let directory = tempdir().unwrap();
        let mut store = JournalStore::open_in(directory.path(), "real", false).unwrap();
        let first = experiment("first");
        store.append(std::slice::from_ref(&first)).unwrap();

        let lost = serde_json::to_vec(&experiment("lost")).unwrap();
        let result = store.append_with(&lost, |file, bytes| {
            file.write_all(&bytes[..bytes.len() / 2])?;
            Err(io::Error::other("disk full"))
        });
        assert!(matches!(result, Err(CollectionError::Storage(_))));

        let second = experiment("second");
        let third = experiment("third");
        store.append(std::slice::from_ref(&second)).unwrap();
        store.append(std::slice::from_ref(&third)).unwrap();

        let mut reopened = JournalStore::open(store.path(), false).unwrap();
        assert_eq!(load(&mut reopened), vec![first, second, third]);
    }

    #[rstest]
    fn test_journal_poisoned_store_refuses_appends_until_cleared() {
        let directory = tempdir().unwrap();
        let mut store = JournalStore::open_in(directory.path(), "real", false).unwrap();
        store.poisoned = true;

        let result = store.append(&[experiment("refused")]);
        assert!(matches!(result, Err(CollectionError::Poisoned(_))));

        CollectionStore::<Experiment>::clear(&mut store).unwrap();
        let accepted = experiment("accepted");
        store.append(std::slice::from_ref(&accepted)).unwrap();

        assert_eq!(load(&mut store), vec![accepted]);
    }

    #[rstest]
    fn test_journal_reports_corruption_before_tail() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("real.jsonl");
        let valid = serde_json::to_string(&experiment("valid")).unwrap();
        fs::write(&path, format!("not json\n{valid}\n")).unwrap();

        let mut store = JournalStore::open(&path, false).unwrap();
        let result = CollectionStore::<Experiment>::load(&mut store);

        assert!(matches!(
            result,
            Err(CollectionError::Corrupt { line: 1, .. })
        ));
    }

    #[rstest]
    fn test_journal_skips_blank_lines() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("real.jsonl");
        let record = experiment("only");
        let line = serde_json::to_string(&record).unwrap();
        fs::write(&path, format!("\n{line}\n\n")).unwrap();

        let mut store = JournalStore::open(&path, false).unwrap();

        assert_eq!(load(&mut store), vec![record]);
    }

    #[rstest]
    fn test_journal_terminates_unterminated_last_record() {
        let directory = tempdir().unwrap();
        let path = directory.path().join("real.jsonl");
        let first = experiment("first");
        fs::write(&path, serde_json::to_string(&first).unwrap()).unwrap();

        let mut store = JournalStore::open(&path, false).unwrap();
        assert_eq!(load(&mut store), vec![first.clone()]);

        let second = experiment("second");
        store.append(std::slice::from_ref(&second)).unwrap();

        let mut reopened = JournalStore::open(&path, false).unwrap();
        assert_eq!(load(&mut reopened), vec![first, second]);
    }
}
