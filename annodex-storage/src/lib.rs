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

//! Annodex Storage Layer
//!
//! Disk backing for the annotation index: lazy per-key record files for
//! HOI annotations and a blob-per-map serialized cache with atomic
//! replacement. The corpus is read-only after load, so there is no write
//! path here beyond cache (re)generation.

pub mod cache;
pub mod record_store;

pub use cache::{
    CacheBuilder, IndexCache, BLOB_ACTS, BLOB_HOI_TO_SACT, BLOB_METADATA, BLOB_SACTS,
    BLOB_SACT_TO_ACT, HOI_DIR,
};
pub use record_store::{LazyRecordStore, Result, StoreError};

/// Lazy store of HOI records, the one level large enough to warrant
/// deferred deserialization.
pub type HoiStore = LazyRecordStore<annodex_core::Hoi>;
