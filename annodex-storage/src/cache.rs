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

//! Serialized index cache
//!
//! One bincode blob per top-level index map, plus a record directory of
//! per-HOI entries following the [`LazyRecordStore`](crate::LazyRecordStore)
//! convention. Regeneration writes into a temp sibling directory and
//! renames it into place, so a reader never observes a half-written
//! cache; a cache missing any required artifact is reported as
//! [`StoreError::CacheIncomplete`] and treated by consumers as absent.

use crate::record_store::{Result, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Map blobs every complete cache must carry.
pub const BLOB_METADATA: &str = "metadata.bin";
pub const BLOB_ACTS: &str = "acts.bin";
pub const BLOB_SACTS: &str = "sacts.bin";
pub const BLOB_SACT_TO_ACT: &str = "sact_to_act.bin";
pub const BLOB_HOI_TO_SACT: &str = "hoi_to_sact.bin";

/// Per-HOI record subdirectory.
pub const HOI_DIR: &str = "hoi";

const REQUIRED_BLOBS: [&str; 5] = [
    BLOB_METADATA,
    BLOB_ACTS,
    BLOB_SACTS,
    BLOB_SACT_TO_ACT,
    BLOB_HOI_TO_SACT,
];

/// Read side of the serialized index cache.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn hoi_dir(&self) -> PathBuf {
        self.dir.join(HOI_DIR)
    }

    /// Check structural completeness: every map blob present and the HOI
    /// record directory in place. A partially-written cache fails here,
    /// before any blob is trusted.
    pub fn validate(&self) -> Result<()> {
        if !self.dir.is_dir() {
            return Err(StoreError::CacheIncomplete(format!(
                "cache directory {} does not exist",
                self.dir.display()
            )));
        }
        for blob in REQUIRED_BLOBS {
            if !self.dir.join(blob).is_file() {
                return Err(StoreError::CacheIncomplete(format!("missing blob {blob}")));
            }
        }
        if !self.hoi_dir().is_dir() {
            return Err(StoreError::CacheIncomplete(
                "missing hoi record directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Deserialize one map blob.
    pub fn read_blob<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(StoreError::CacheIncomplete(format!("missing blob {name}")));
        }
        let file = File::open(path)?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }
}

/// Write side: stages a full cache in a temp sibling directory, then
/// renames it over the target in one step.
pub struct CacheBuilder {
    staging: PathBuf,
    target: PathBuf,
}

impl CacheBuilder {
    /// Begin staging a cache destined for `target`. Any leftover staging
    /// directory from an aborted build is discarded.
    pub fn begin(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let staging = staging_path(&target);
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(staging.join(HOI_DIR))?;
        Ok(Self { staging, target })
    }

    /// Serialize one map blob into the staging directory.
    pub fn write_blob<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let file = File::create(self.staging.join(name))?;
        bincode::serialize_into(BufWriter::new(file), value)?;
        Ok(())
    }

    /// Staging directory for per-HOI records.
    pub fn hoi_dir(&self) -> PathBuf {
        self.staging.join(HOI_DIR)
    }

    /// Atomically replace the target cache with the staged one.
    pub fn commit(self) -> Result<IndexCache> {
        if self.target.exists() {
            fs::remove_dir_all(&self.target)?;
        }
        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&self.staging, &self.target)?;
        info!(cache = %self.target.display(), "index cache committed");
        Ok(IndexCache::new(self.target))
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".staging");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_map() -> HashMap<String, u32> {
        HashMap::from([("A1".to_string(), 1), ("A2".to_string(), 2)])
    }

    fn write_complete_cache(target: &Path) -> IndexCache {
        let builder = CacheBuilder::begin(target).unwrap();
        for blob in REQUIRED_BLOBS {
            builder.write_blob(blob, &sample_map()).unwrap();
        }
        builder.commit().unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let cache = write_complete_cache(&dir.path().join("cache"));
        cache.validate().unwrap();
        let acts: HashMap<String, u32> = cache.read_blob(BLOB_ACTS).unwrap();
        assert_eq!(acts, sample_map());
    }

    #[test]
    fn test_missing_blob_is_incomplete() {
        let dir = tempdir().unwrap();
        let cache = write_complete_cache(&dir.path().join("cache"));
        fs::remove_file(cache.dir().join(BLOB_SACTS)).unwrap();
        assert!(matches!(
            cache.validate(),
            Err(StoreError::CacheIncomplete(_))
        ));
    }

    #[test]
    fn test_absent_dir_is_incomplete() {
        let dir = tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("never-written"));
        assert!(matches!(
            cache.validate(),
            Err(StoreError::CacheIncomplete(_))
        ));
    }

    #[test]
    fn test_commit_replaces_previous_cache() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("cache");
        write_complete_cache(&target);

        let builder = CacheBuilder::begin(&target).unwrap();
        let other = HashMap::from([("B1".to_string(), 9u32)]);
        for blob in REQUIRED_BLOBS {
            builder.write_blob(blob, &other).unwrap();
        }
        let cache = builder.commit().unwrap();

        let acts: HashMap<String, u32> = cache.read_blob(BLOB_ACTS).unwrap();
        assert_eq!(acts, other);
    }

    #[test]
    fn test_abandoned_staging_not_trusted() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("cache");
        // Staged but never committed.
        let builder = CacheBuilder::begin(&target).unwrap();
        builder.write_blob(BLOB_ACTS, &sample_map()).unwrap();
        drop(builder);

        let cache = IndexCache::new(&target);
        assert!(matches!(
            cache.validate(),
            Err(StoreError::CacheIncomplete(_))
        ));
    }
}
