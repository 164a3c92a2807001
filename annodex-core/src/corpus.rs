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

//! Canonical corpus document schema
//!
//! The corpus is a single JSON array of per-raw-video records; the
//! activity object nests its sub-activities, each sub-activity nests its
//! HOIs. This module is the fixed schema only — required fields are
//! enforced by serde at parse time, so a malformed record fails the whole
//! load with a structured error instead of deferring to first access.
//! Class-ID resolution and structural validation happen in the index
//! layer, which consumes these raw records.

use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading the corpus document.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read corpus document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed corpus document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One per-raw-video record of the corpus document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVideo {
    pub file_name: String,
    pub num_frames: u32,
    pub width: u32,
    pub height: u32,
    pub duration: f64,
    pub activity: RawActivity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawActivity {
    pub id: String,
    pub class_name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub sub_activities: Vec<RawSubActivity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubActivity {
    pub id: String,
    pub class_name: String,
    pub start_time: f64,
    pub end_time: f64,
    pub higher_order_interactions: Vec<RawHoi>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHoi {
    pub id: String,
    pub time: f64,
    pub actors: Vec<RawEntity>,
    pub objects: Vec<RawEntity>,
    pub intransitive_actions: Vec<RawUnaryPredicate>,
    pub transitive_actions: Vec<RawBinaryPredicate>,
    pub attributes: Vec<RawUnaryPredicate>,
    pub relationships: Vec<RawBinaryPredicate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEntity {
    pub id: String,
    pub class_name: String,
    /// `[x, y, width, height]` in pixel coordinates.
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUnaryPredicate {
    pub class_name: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBinaryPredicate {
    pub class_name: String,
    pub source_id: String,
    pub target_id: String,
}

/// Parse a corpus document from a JSON string.
pub fn parse(json: &str) -> Result<Vec<RawVideo>, CorpusError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a corpus document from disk.
pub fn load(path: &Path) -> Result<Vec<RawVideo>, CorpusError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"[
        {
            "file_name": "v1.mp4",
            "num_frames": 1000,
            "width": 640,
            "height": 480,
            "duration": 100.0,
            "activity": {
                "id": "A1",
                "class_name": "meal_prep",
                "start_time": 0.0,
                "end_time": 100.0,
                "sub_activities": [
                    {
                        "id": "S1",
                        "class_name": "cooking",
                        "start_time": 10.0,
                        "end_time": 50.0,
                        "higher_order_interactions": [
                            {
                                "id": "H1",
                                "time": 12.0,
                                "actors": [
                                    {"id": "A", "class_name": "chef", "bbox": [0.0, 0.0, 10.0, 20.0]}
                                ],
                                "objects": [
                                    {"id": "1", "class_name": "knife", "bbox": [5.0, 5.0, 3.0, 3.0]}
                                ],
                                "intransitive_actions": [
                                    {"class_name": "stand", "source_id": "A"}
                                ],
                                "transitive_actions": [
                                    {"class_name": "hold", "source_id": "A", "target_id": "1"}
                                ],
                                "attributes": [],
                                "relationships": []
                            }
                        ]
                    }
                ]
            }
        }
    ]"#;

    #[test]
    fn test_parse_minimal_corpus() {
        let videos = parse(MINIMAL).unwrap();
        assert_eq!(videos.len(), 1);
        let act = &videos[0].activity;
        assert_eq!(act.id, "A1");
        assert_eq!(act.sub_activities.len(), 1);
        let hoi = &act.sub_activities[0].higher_order_interactions[0];
        assert_eq!(hoi.actors[0].id, "A");
        assert_eq!(hoi.transitive_actions[0].target_id, "1");
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        // target_id missing on a transitive action
        let bad = MINIMAL.replace(r#""target_id": "1""#, r#""unrelated": "1""#);
        assert!(matches!(parse(&bad), Err(CorpusError::Json(_))));
    }
}
