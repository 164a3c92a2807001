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

//! Annodex Core
//!
//! Record types and the canonical corpus schema for the hierarchical
//! video-annotation corpus: raw video → activity → sub-activity → HOI,
//! with typed entities and predicates per HOI.

pub mod config;
pub mod corpus;
pub mod types;

pub use config::DatasetDirs;
pub use corpus::{
    CorpusError, RawActivity, RawBinaryPredicate, RawEntity, RawHoi, RawSubActivity,
    RawUnaryPredicate, RawVideo,
};
pub use types::{
    Activity, BBox, BinaryKind, BinaryPredicate, Entity, EntityKind, Hoi, Level, Metadatum,
    SubActivity, UnaryKind, UnaryPredicate,
};
