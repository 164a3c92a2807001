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

//! Dataset directory layout
//!
//! Canonical locations of the corpus document, taxonomy artifacts, index
//! cache, and trimmed media files under a single dataset root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Canonical dataset layout rooted at a single directory.
///
/// ```text
/// <root>/
///   anns/
///     anns.json            corpus document
///     taxonomy/            one artifact per annotation kind
///     cache/               serialized index (regenerable)
///   videos/
///     raw/<fname>
///     activity/<id>.mp4
///     sub_activity/<id>.mp4
///     interaction/<id>.jpg
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDirs {
    root: PathBuf,
}

impl DatasetDirs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The corpus document.
    pub fn anns_file(&self) -> PathBuf {
        self.root.join("anns").join("anns.json")
    }

    /// Directory of taxonomy artifacts.
    pub fn taxonomy_dir(&self) -> PathBuf {
        self.root.join("anns").join("taxonomy")
    }

    /// Directory of the serialized index cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("anns").join("cache")
    }

    /// Path of a raw (untrimmed) video file.
    pub fn raw_video(&self, fname: &str) -> PathBuf {
        self.root.join("videos").join("raw").join(fname)
    }

    /// Path of a trimmed activity video.
    pub fn activity_video(&self, act_id: &str) -> PathBuf {
        self.root
            .join("videos")
            .join("activity")
            .join(format!("{act_id}.mp4"))
    }

    /// Path of a trimmed sub-activity video.
    pub fn sub_activity_video(&self, sact_id: &str) -> PathBuf {
        self.root
            .join("videos")
            .join("sub_activity")
            .join(format!("{sact_id}.mp4"))
    }

    /// Path of an HOI frame image.
    pub fn interaction_frame(&self, hoi_id: &str) -> PathBuf {
        self.root
            .join("videos")
            .join("interaction")
            .join(format!("{hoi_id}.jpg"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let dirs = DatasetDirs::new("/data/corpus");
        assert_eq!(
            dirs.anns_file(),
            PathBuf::from("/data/corpus/anns/anns.json")
        );
        assert_eq!(
            dirs.activity_video("A1"),
            PathBuf::from("/data/corpus/videos/activity/A1.mp4")
        );
        assert_eq!(
            dirs.interaction_frame("H1"),
            PathBuf::from("/data/corpus/videos/interaction/H1.jpg")
        );
    }
}
