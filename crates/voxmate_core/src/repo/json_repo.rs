//! Whole-file JSON repository contracts and implementation.
//!
//! # Responsibility
//! - Provide `list/add/remove/update` over one JSON array file per collection.
//! - Keep file layout and serde details inside the persistence boundary.
//!
//! # Invariants
//! - Every operation loads the full file and rewrites it whole; the last
//!   writer wins.
//! - A missing or blank file is an empty collection.
//! - Reads surface corruption as [`StorageError::Corrupt`]; callers decide
//!   whether to fall back (see [`CollectionRepository::list_or_empty`]).
//! - Writes land in a sibling temp file and are renamed over the target.
//! - No locking: a single caller thread is assumed.

use crate::model::{Record, RecordId};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, StorageError>;

/// Persistence error for JSON-backed collections.
#[derive(Debug)]
pub enum StorageError {
    /// File exists but could not be read or written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// File content is not a valid snapshot for this collection.
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Records could not be serialized.
    Encode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "storage io error at `{}`: {source}", path.display()),
            Self::Corrupt { path, source } => {
                write!(f, "corrupt storage file `{}`: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode records: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

/// Repository interface for one independent record collection.
pub trait CollectionRepository<T: Record> {
    /// Returns all records in insertion order.
    fn list(&self) -> StoreResult<Vec<T>>;

    /// Inserts `record` with a freshly assigned id and returns the stored copy.
    fn add(&self, record: T) -> StoreResult<T>;

    /// Removes one record. Returns `false` (no-op) for unknown ids.
    fn remove(&self, id: RecordId) -> StoreResult<bool>;

    /// Applies `apply` to the record with `id`. Returns `None` for unknown ids.
    fn update<F>(&self, id: RecordId, apply: F) -> StoreResult<Option<T>>
    where
        F: FnOnce(&mut T);

    /// Applies `apply` to every record; records for which it returns `true`
    /// are reported as changed. The file is rewritten only when something
    /// changed.
    fn update_matching<F>(&self, apply: F) -> StoreResult<Vec<T>>
    where
        F: FnMut(&mut T) -> bool;

    /// Lists records, substituting an empty collection on storage failure.
    ///
    /// Failures are logged as warnings, never propagated.
    fn list_or_empty(&self) -> Vec<T> {
        match self.list() {
            Ok(records) => records,
            Err(err) => {
                warn!(
                    "event=store_list module=repo status=fallback collection={} error={}",
                    T::COLLECTION,
                    err
                );
                Vec::new()
            }
        }
    }
}

/// JSON-array file repository for one collection.
#[derive(Debug, Clone)]
pub struct JsonFileRepository<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileRepository<T> {
    /// Uses an explicit snapshot path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Uses `<data_dir>/<T::FILE_NAME>`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(T::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads for a mutation; a corrupt file is moved aside and replaced by an
    /// empty collection so the write can proceed.
    fn load_for_write(&self) -> StoreResult<Vec<T>> {
        match self.load() {
            Err(StorageError::Corrupt { path, source }) => {
                let quarantine = quarantine_path(&path);
                let moved = fs::rename(&path, &quarantine).is_ok();
                warn!(
                    "event=store_load module=repo status=reset collection={} path={} quarantined={} error={}",
                    T::COLLECTION,
                    path.display(),
                    moved,
                    source
                );
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn save(&self, records: &[T]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(records).map_err(StorageError::Encode)?;
        let temp_path = temp_path(&self.path);
        fs::write(&temp_path, json).map_err(|source| StorageError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "event=store_save module=repo status=ok collection={} count={}",
            T::COLLECTION,
            records.len()
        );
        Ok(())
    }
}

impl<T: Record> CollectionRepository<T> for JsonFileRepository<T> {
    fn list(&self) -> StoreResult<Vec<T>> {
        self.load()
    }

    fn add(&self, mut record: T) -> StoreResult<T> {
        let mut records = self.load_for_write()?;
        record.assign_id(next_id(&records));
        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    fn remove(&self, id: RecordId) -> StoreResult<bool> {
        let mut records = self.load_for_write()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records)?;
        Ok(true)
    }

    fn update<F>(&self, id: RecordId, apply: F) -> StoreResult<Option<T>>
    where
        F: FnOnce(&mut T),
    {
        let mut records = self.load_for_write()?;
        let Some(record) = records.iter_mut().find(|record| record.id() == id) else {
            return Ok(None);
        };
        apply(record);
        let updated = record.clone();
        self.save(&records)?;
        Ok(Some(updated))
    }

    fn update_matching<F>(&self, mut apply: F) -> StoreResult<Vec<T>>
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut records = self.load_for_write()?;
        let mut changed = Vec::new();
        for record in records.iter_mut() {
            if apply(record) {
                changed.push(record.clone());
            }
        }
        if !changed.is_empty() {
            self.save(&records)?;
        }
        Ok(changed)
    }
}

fn next_id<T: Record>(records: &[T]) -> RecordId {
    records.iter().map(Record::id).max().unwrap_or(0) + 1
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}
