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

//! Canonical media path resolution
//!
//! Maps annotation IDs (or raw video file names) to their media files
//! under the dataset root. Resolution is pure arithmetic on the layout;
//! [`PathQuery::verify`] additionally demands the file exist on disk.

use crate::engine::{Annodex, QueryError, Result};
use annodex_core::Level;
use std::path::PathBuf;

/// Builder for one media path. Exactly one selector must be set.
pub struct PathQuery<'a> {
    dex: &'a Annodex,
    id_act: Option<String>,
    id_sact: Option<String>,
    id_hoi: Option<String>,
    raw_video: Option<String>,
}

impl Annodex {
    pub fn get_paths(&self) -> PathQuery<'_> {
        PathQuery {
            dex: self,
            id_act: None,
            id_sact: None,
            id_hoi: None,
            raw_video: None,
        }
    }
}

impl<'a> PathQuery<'a> {
    /// Trimmed activity video, `videos/activity/{id}.mp4`.
    pub fn id_act(mut self, id: impl Into<String>) -> Self {
        self.id_act = Some(id.into());
        self
    }

    /// Trimmed sub-activity video, `videos/sub_activity/{id}.mp4`.
    pub fn id_sact(mut self, id: impl Into<String>) -> Self {
        self.id_sact = Some(id.into());
        self
    }

    /// Single interaction frame, `videos/interaction/{id}.jpg`.
    pub fn id_hoi(mut self, id: impl Into<String>) -> Self {
        self.id_hoi = Some(id.into());
        self
    }

    /// Untrimmed source video by file name, `videos/raw/{fname}`.
    pub fn raw_video(mut self, fname: impl Into<String>) -> Self {
        self.raw_video = Some(fname.into());
        self
    }

    /// Resolve the path without touching the filesystem.
    pub fn execute(self) -> Result<PathBuf> {
        let dirs = self.dex.dirs();
        let lookup = self.dex.lookup();

        let selectors = [
            self.id_act.is_some(),
            self.id_sact.is_some(),
            self.id_hoi.is_some(),
            self.raw_video.is_some(),
        ];
        if selectors.iter().filter(|set| **set).count() != 1 {
            return Err(QueryError::InvalidCriteriaCombination(
                "path query takes exactly one selector".to_string(),
            ));
        }

        if let Some(id) = self.id_act {
            if lookup.act(&id).is_none() {
                return Err(QueryError::UnknownId {
                    level: Level::Act,
                    id,
                });
            }
            return Ok(dirs.activity_video(&id));
        }
        if let Some(id) = self.id_sact {
            if lookup.sact(&id).is_none() {
                return Err(QueryError::UnknownId {
                    level: Level::Sact,
                    id,
                });
            }
            return Ok(dirs.sub_activity_video(&id));
        }
        if let Some(id) = self.id_hoi {
            if !lookup.contains_hoi(&id) {
                return Err(QueryError::UnknownId {
                    level: Level::Hoi,
                    id,
                });
            }
            return Ok(dirs.interaction_frame(&id));
        }

        // Raw videos are keyed by file name, not annotation ID; the name
        // must still belong to the corpus.
        let fname = self.raw_video.unwrap_or_default();
        let known = lookup
            .act_ids()
            .filter_map(|id| lookup.metadatum(id))
            .any(|meta| meta.fname == fname);
        if !known {
            return Err(QueryError::UnknownId {
                level: Level::Act,
                id: fname,
            });
        }
        Ok(dirs.raw_video(&fname))
    }

    /// Resolve the path and require it to exist on disk.
    pub fn verify(self) -> Result<PathBuf> {
        let path = self.execute()?;
        if !path.exists() {
            return Err(QueryError::PathMissing(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annodex_index::fixtures;
    use std::fs;

    #[test]
    fn test_path_resolution() {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();

        let path = dex.get_paths().id_act("A1").execute().unwrap();
        assert_eq!(path, root.path().join("videos/activity/A1.mp4"));

        let path = dex.get_paths().id_sact("S2").execute().unwrap();
        assert_eq!(path, root.path().join("videos/sub_activity/S2.mp4"));

        let path = dex.get_paths().id_hoi("H3").execute().unwrap();
        assert_eq!(path, root.path().join("videos/interaction/H3.jpg"));

        let path = dex.get_paths().raw_video("v2.mp4").execute().unwrap();
        assert_eq!(path, root.path().join("videos/raw/v2.mp4"));
    }

    #[test]
    fn test_exactly_one_selector() {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();

        assert!(matches!(
            dex.get_paths().execute(),
            Err(QueryError::InvalidCriteriaCombination(_))
        ));
        assert!(matches!(
            dex.get_paths().id_act("A1").id_hoi("H1").execute(),
            Err(QueryError::InvalidCriteriaCombination(_))
        ));
    }

    #[test]
    fn test_unknown_targets() {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();

        assert!(matches!(
            dex.get_paths().id_sact("S9").execute(),
            Err(QueryError::UnknownId {
                level: Level::Sact,
                ..
            })
        ));
        assert!(matches!(
            dex.get_paths().raw_video("missing.mp4").execute(),
            Err(QueryError::UnknownId { .. })
        ));
    }

    #[test]
    fn test_verify_demands_existence() {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();

        assert!(matches!(
            dex.get_paths().id_act("A1").verify(),
            Err(QueryError::PathMissing(_))
        ));

        let video = root.path().join("videos/activity");
        fs::create_dir_all(&video).unwrap();
        fs::write(video.join("A1.mp4"), b"").unwrap();
        let path = dex.get_paths().id_act("A1").verify().unwrap();
        assert!(path.ends_with("videos/activity/A1.mp4"));
    }
}
