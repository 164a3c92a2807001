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

//! Record types for the four-level annotation hierarchy
//!
//! Raw video → activity → sub-activity → higher-order interaction (HOI),
//! with entities and predicates hanging off each HOI. All records are
//! built once at load time and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchy level of an annotation record.
///
/// Used in error reporting and cross-level traversal; the hierarchy depth
/// is fixed at these three annotated levels plus the raw video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Activity: top-level temporal segment of a raw video.
    Act,
    /// Sub-activity: temporal sub-segment of an activity.
    Sact,
    /// Higher-order interaction: one annotated instant of a sub-activity.
    Hoi,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Act => write!(f, "activity"),
            Level::Sact => write!(f, "sub-activity"),
            Level::Hoi => write!(f, "hoi"),
        }
    }
}

/// Per-raw-video facts: file name, frame geometry, duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadatum {
    /// Raw video file name (relative to the raw-video directory).
    pub fname: String,
    /// Total frame count, >= 1.
    pub num_frames: u32,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Duration in seconds, > 0.
    pub duration: f64,
}

impl Metadatum {
    /// Frame index for an absolute timestamp (seconds).
    ///
    /// `fid = time * (num_frames - 1) / duration`, rounded to the
    /// nearest frame.
    pub fn fid(&self, time: f64) -> u32 {
        (time * (self.num_frames - 1) as f64 / self.duration).round() as u32
    }
}

/// Top-level temporal segment of a raw video.
///
/// Times are seconds, half-open `[start, end)`. `sact_ids` preserves
/// annotation order, which is not necessarily temporal order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub cname: String,
    pub cid: usize,
    pub start: f64,
    pub end: f64,
    pub sact_ids: Vec<String>,
}

/// Temporal sub-segment of an activity.
///
/// `actor_ids`/`object_ids` are the sorted-unique union of entity IDs
/// appearing anywhere among this sub-activity's HOIs. Entity IDs are
/// local: the same ID in two different sub-activities denotes unrelated
/// entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubActivity {
    pub id: String,
    pub cname: String,
    pub cid: usize,
    pub start: f64,
    pub end: f64,
    pub hoi_ids: Vec<String>,
    pub actor_ids: Vec<String>,
    pub object_ids: Vec<String>,
}

/// A single annotated time instant within a sub-activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hoi {
    pub id: String,
    /// Timestamp in seconds, absolute to the raw video.
    pub time: f64,
    pub actors: Vec<Entity>,
    pub objects: Vec<Entity>,
    /// Intransitive actions.
    pub ias: Vec<UnaryPredicate>,
    /// Transitive actions.
    pub tas: Vec<BinaryPredicate>,
    /// Attributes.
    pub atts: Vec<UnaryPredicate>,
    /// Relationships.
    pub rels: Vec<BinaryPredicate>,
}

impl Hoi {
    /// All entities (actors then objects) observed at this instant.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.actors.iter().chain(self.objects.iter())
    }
}

/// Entity kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Actor,
    Object,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Actor => write!(f, "actor"),
            EntityKind::Object => write!(f, "object"),
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn x1(&self) -> f64 {
        self.x
    }

    pub fn y1(&self) -> f64 {
        self.y
    }

    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    pub fn y2(&self) -> f64 {
        self.y + self.height
    }
}

/// An actor or object instance at one HOI.
///
/// The instance ID is scoped to the enclosing sub-activity. Actor IDs are
/// short uppercase letter sequences ("A", "B", ...); object IDs are
/// positive integers rendered as strings ("1", "2", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub cname: String,
    pub cid: usize,
    pub bbox: BBox,
}

/// Unary predicate kinds: one source entity, no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryKind {
    IntransitiveAction,
    Attribute,
}

impl fmt::Display for UnaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryKind::IntransitiveAction => write!(f, "intransitive action"),
            UnaryKind::Attribute => write!(f, "attribute"),
        }
    }
}

/// Binary predicate kinds: source and target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryKind {
    TransitiveAction,
    Relationship,
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryKind::TransitiveAction => write!(f, "transitive action"),
            BinaryKind::Relationship => write!(f, "relationship"),
        }
    }
}

/// A unary relation over one entity at one HOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryPredicate {
    pub kind: UnaryKind,
    pub cname: String,
    pub cid: usize,
    pub source_id: String,
}

/// A binary relation over a (source, target) entity pair at one HOI.
///
/// The target is a required field here, not an `Option`: unary and
/// binary predicates are distinct types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryPredicate {
    pub kind: BinaryKind,
    pub cname: String,
    pub cid: usize,
    pub source_id: String,
    pub target_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fid_endpoints() {
        let meta = Metadatum {
            fname: "v1.mp4".to_string(),
            num_frames: 301,
            width: 640,
            height: 480,
            duration: 10.0,
        };
        assert_eq!(meta.fid(0.0), 0);
        assert_eq!(meta.fid(10.0), 300);
        assert_eq!(meta.fid(5.0), 150);
    }

    #[test]
    fn test_fid_rounds_to_nearest() {
        let meta = Metadatum {
            fname: "v2.mp4".to_string(),
            num_frames: 101,
            width: 320,
            height: 240,
            duration: 100.0,
        };
        // 33.4s * 100/100 = 33.4 -> frame 33
        assert_eq!(meta.fid(33.4), 33);
        assert_eq!(meta.fid(33.6), 34);
    }

    #[test]
    fn test_bbox_corners() {
        let bbox = BBox {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(bbox.x2(), 40.0);
        assert_eq!(bbox.y2(), 60.0);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Sact.to_string(), "sub-activity");
    }
}
