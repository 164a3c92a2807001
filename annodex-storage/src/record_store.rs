// Copyright 2025 Annodex (https://github.com/annodex)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Lazy record store
//!
//! Read-only mapping over records persisted one-per-key as bincode files.
//! A record is deserialized on first access and retained in memory
//! thereafter; the key set comes from the directory listing, so
//! enumerating keys never touches record payloads. HOI annotations can
//! vastly outnumber activity and sub-activity annotations, so eagerly
//! materializing every record is wasteful when a query only needs a
//! filtered subset.

use moka::sync::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// File extension of persisted records.
const RECORD_EXT: &str = "bin";

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is not present in the backing store.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A cache directory is missing one or more required artifacts.
    /// Consumers treat this as "no cache", not as corruption.
    #[error("cache incomplete: {0}")]
    CacheIncomplete(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Failure propagated from a concurrent fill of the same key.
    #[error("{0}")]
    Shared(Arc<StoreError>),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Disk-backed mapping from key to deserialized record.
///
/// **Thread safety:** the memoization is a fill-once cache; concurrent
/// first accesses to the same key deserialize exactly once and other
/// readers wait for the fill.
pub struct LazyRecordStore<T> {
    dir: PathBuf,
    keys: BTreeSet<String>,
    cache: Cache<String, Arc<T>>,
}

impl<T> fmt::Debug for LazyRecordStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRecordStore")
            .field("dir", &self.dir)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl<T> LazyRecordStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open a store over a directory of `<key>.bin` records.
    ///
    /// Only the directory listing is read; no payload is deserialized.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut keys = BTreeSet::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.insert(stem.to_string());
            }
        }
        Ok(Self {
            dir,
            keys,
            cache: Cache::builder().build(),
        })
    }

    /// Available keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fetch a record, deserializing it on first access.
    pub fn get(&self, key: &str) -> Result<Arc<T>> {
        if !self.keys.contains(key) {
            return Err(StoreError::RecordNotFound(key.to_string()));
        }
        let path = self.record_path(key);
        self.cache
            .try_get_with(key.to_string(), || read_record(&path))
            .map_err(StoreError::Shared)
    }

    /// Number of records currently resident in memory.
    pub fn resident(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Iterate all records in key order. Goes through `get` per key, so
    /// the memoization still applies.
    pub fn iter(&self) -> impl Iterator<Item = Result<(&str, Arc<T>)>> {
        self.keys
            .iter()
            .map(move |k| self.get(k).map(|v| (k.as_str(), v)))
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXT}"))
    }

    /// Persist one record into `dir` under the store's naming convention.
    ///
    /// Writer half, used only while (re)generating a cache; an open store
    /// never observes its directory changing.
    pub fn write_record(dir: &Path, key: &str, value: &T) -> Result<()> {
        let path = dir.join(format!("{key}.{RECORD_EXT}"));
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), value)?;
        Ok(())
    }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Arc<T>> {
    let file = File::open(path)?;
    let value = bincode::deserialize_from(BufReader::new(file))?;
    Ok(Arc::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rec {
        id: String,
        value: u32,
    }

    fn write_fixtures(dir: &Path, n: u32) {
        for i in 0..n {
            let rec = Rec {
                id: format!("r{i}"),
                value: i,
            };
            LazyRecordStore::write_record(dir, &rec.id, &rec).unwrap();
        }
    }

    #[test]
    fn test_keys_from_listing() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), 3);
        let store: LazyRecordStore<Rec> = LazyRecordStore::open(dir.path()).unwrap();
        let keys: Vec<&str> = store.keys().collect();
        assert_eq!(keys, vec!["r0", "r1", "r2"]);
        // Nothing deserialized yet.
        assert_eq!(store.resident(), 0);
    }

    #[test]
    fn test_get_memoizes() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), 2);
        let store: LazyRecordStore<Rec> = LazyRecordStore::open(dir.path()).unwrap();

        let first = store.get("r1").unwrap();
        assert_eq!(first.value, 1);
        assert_eq!(store.resident(), 1);

        // Second access returns the retained record.
        let second = store.get("r1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_key() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), 1);
        let store: LazyRecordStore<Rec> = LazyRecordStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.get("missing"),
            Err(StoreError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_iter_in_key_order() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), 4);
        let store: LazyRecordStore<Rec> = LazyRecordStore::open(dir.path()).unwrap();
        let values: Vec<u32> = store.iter().map(|r| r.unwrap().1.value).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_non_record_files_ignored() {
        let dir = tempdir().unwrap();
        write_fixtures(dir.path(), 1);
        std::fs::write(dir.path().join("MANIFEST.txt"), b"not a record").unwrap();
        let store: LazyRecordStore<Rec> = LazyRecordStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }
}
