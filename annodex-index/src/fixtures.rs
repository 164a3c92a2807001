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

//! On-disk dataset fixtures for tests
//!
//! A two-video corpus exercising every annotation kind, plus the matching
//! taxonomy. Kept small enough to reason about by hand:
//!
//! - `A1` (meal_prep, `[0, 100)`) with `S1` (cooking, `[10, 50)`: H1, H2)
//!   and `S2` (cleaning, `[50, 90)`: H3)
//! - `A2` (chores, `[0, 80)`) with `S3` (cleaning, `[5, 40)`: H4)

use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Corpus document backing the fixture dataset.
pub const CORPUS: &str = r#"[
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
                            "attributes": [
                                {"class_name": "dirty", "source_id": "1"}
                            ],
                            "relationships": [
                                {"class_name": "behind", "source_id": "A", "target_id": "1"}
                            ]
                        },
                        {
                            "id": "H2",
                            "time": 40.0,
                            "actors": [
                                {"id": "B", "class_name": "assistant", "bbox": [100.0, 0.0, 10.0, 20.0]}
                            ],
                            "objects": [],
                            "intransitive_actions": [
                                {"class_name": "walk", "source_id": "B"}
                            ],
                            "transitive_actions": [],
                            "attributes": [],
                            "relationships": []
                        }
                    ]
                },
                {
                    "id": "S2",
                    "class_name": "cleaning",
                    "start_time": 50.0,
                    "end_time": 90.0,
                    "higher_order_interactions": [
                        {
                            "id": "H3",
                            "time": 60.0,
                            "actors": [
                                {"id": "A", "class_name": "assistant", "bbox": [0.0, 0.0, 10.0, 20.0]}
                            ],
                            "objects": [
                                {"id": "1", "class_name": "pan", "bbox": [30.0, 30.0, 8.0, 8.0]}
                            ],
                            "intransitive_actions": [],
                            "transitive_actions": [],
                            "attributes": [
                                {"class_name": "dirty", "source_id": "1"}
                            ],
                            "relationships": []
                        }
                    ]
                }
            ]
        }
    },
    {
        "file_name": "v2.mp4",
        "num_frames": 800,
        "width": 640,
        "height": 480,
        "duration": 80.0,
        "activity": {
            "id": "A2",
            "class_name": "chores",
            "start_time": 0.0,
            "end_time": 80.0,
            "sub_activities": [
                {
                    "id": "S3",
                    "class_name": "cleaning",
                    "start_time": 5.0,
                    "end_time": 40.0,
                    "higher_order_interactions": [
                        {
                            "id": "H4",
                            "time": 10.0,
                            "actors": [
                                {"id": "A", "class_name": "assistant", "bbox": [0.0, 0.0, 10.0, 20.0]}
                            ],
                            "objects": [],
                            "intransitive_actions": [
                                {"class_name": "walk", "source_id": "A"}
                            ],
                            "transitive_actions": [],
                            "attributes": [],
                            "relationships": []
                        }
                    ]
                }
            ]
        }
    }
]"#;

/// Write the fixture taxonomy artifacts into `dir`.
pub fn write_taxonomy(dir: &Path) {
    let write = |name: &str, body: &str| {
        fs::write(dir.join(name), body).unwrap();
    };

    write("activity.json", r#"{"household": ["meal_prep", "chores"]}"#);
    write(
        "sub_activity.json",
        r#"{"meal_prep": ["cooking", "plating"], "chores": ["cleaning"]}"#,
    );
    write("actor.json", r#"{"person": ["chef", "assistant"]}"#);
    write("object.json", r#"{"kitchenware": ["knife", "pan"]}"#);
    write(
        "intransitive_action.json",
        r#"{"body": [["stand", "actor"], ["walk", "actor"]]}"#,
    );
    write(
        "transitive_action.json",
        r#"{"manipulation": [["hold", "actor", "object"], ["cut", "actor", "object"]]}"#,
    );
    write(
        "attribute.json",
        r#"{"state": [["dirty", "object"], ["open", "object"]]}"#,
    );
    write(
        "relationship.json",
        r#"{"spatial": [["behind", "actor", "object"], ["near", "actor", "actor"]]}"#,
    );
    write(
        "act_sact.json",
        r#"{"meal_prep": ["cooking", "plating"], "chores": ["cleaning"]}"#,
    );
    write(
        "few_shot.json",
        r#"{
            "act": {"train": ["meal_prep"], "val": ["chores"], "test": []},
            "sact": {"train": ["cooking", "plating"], "val": ["cleaning"], "test": []}
        }"#,
    );
}

/// Write a complete dataset root: corpus document plus taxonomy.
pub fn write_dataset() -> TempDir {
    write_dataset_with(|json| json.to_string())
}

/// Write a dataset root with the corpus document transformed first.
/// Used to inject structural violations.
pub fn write_dataset_with(mutate: impl Fn(&str) -> String) -> TempDir {
    let root = TempDir::new().unwrap();
    let anns = root.path().join("anns");
    let taxonomy = anns.join("taxonomy");
    fs::create_dir_all(&taxonomy).unwrap();

    fs::write(anns.join("anns.json"), mutate(CORPUS)).unwrap();
    write_taxonomy(&taxonomy);
    root
}
