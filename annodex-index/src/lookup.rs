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

//! Annotation index
//!
//! Parses the corpus document (or loads a previously serialized cache)
//! into typed records per level and builds the two bidirectional maps
//! connecting the levels: `sact → act` and `hoi → sact`. All six
//! traversal directions derive from those two maps; no direction ever
//! rescans the corpus.
//!
//! Construction is all-or-nothing: a corpus failing structural
//! validation yields [`IndexError::CorpusInconsistent`] with the level,
//! ID, and nature of the violation. A structurally incomplete cache is
//! treated as absent (full reparse), never as a hard failure.

use crate::bidict::{Bidict, BidictError};
use crate::taxonomy::{Kind, Taxonomy, TaxonomyError};
use annodex_core::corpus::{self, CorpusError, RawBinaryPredicate, RawEntity, RawUnaryPredicate};
use annodex_core::{
    Activity, BBox, BinaryKind, BinaryPredicate, DatasetDirs, Entity, EntityKind, Hoi, Level,
    Metadatum, SubActivity, UnaryKind, UnaryPredicate,
};
use annodex_storage::{
    CacheBuilder, HoiStore, IndexCache, LazyRecordStore, StoreError, BLOB_ACTS, BLOB_HOI_TO_SACT,
    BLOB_METADATA, BLOB_SACTS, BLOB_SACT_TO_ACT,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum IndexError {
    /// Structural validation failure at load time.
    #[error("corpus inconsistent at {level} '{id}': {reason}")]
    CorpusInconsistent {
        level: Level,
        id: String,
        reason: String,
    },

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bidict(#[from] BidictError),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// In-memory maps of one parsed corpus, the unit the cache serializes.
struct Parts {
    metadata: HashMap<String, Metadatum>,
    acts: HashMap<String, Activity>,
    sacts: HashMap<String, SubActivity>,
    hois: Vec<Hoi>,
    sact_to_act: Bidict<String, String>,
    hoi_to_sact: Bidict<String, String>,
}

/// Key-based retrieval and cross-level tracing over one loaded corpus.
///
/// Immutable once constructed; a rebuild replaces the whole index.
#[derive(Debug)]
pub struct Lookup {
    metadata: HashMap<String, Metadatum>,
    acts: HashMap<String, Activity>,
    sacts: HashMap<String, SubActivity>,
    hois: HoiStore,
    sact_to_act: Bidict<String, String>,
    hoi_to_sact: Bidict<String, String>,
}

impl Lookup {
    /// Load the index, preferring the serialized cache.
    ///
    /// An incomplete cache (never written, or a partial leftover) falls
    /// back to a full reparse of the corpus document, which then
    /// regenerates the cache.
    pub fn load(dirs: &DatasetDirs, taxonomy: &Taxonomy) -> Result<Self> {
        let cache = IndexCache::new(dirs.cache_dir());
        match cache.validate() {
            Ok(()) => {
                info!(cache = %cache.dir().display(), "loading index from cache");
                Self::from_cache(&cache)
            }
            Err(StoreError::CacheIncomplete(reason)) => {
                warn!(%reason, "index cache unusable, reparsing corpus");
                Self::rebuild(dirs, taxonomy)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse the corpus document, regenerate the cache, and load from it.
    pub fn rebuild(dirs: &DatasetDirs, taxonomy: &Taxonomy) -> Result<Self> {
        let videos = corpus::load(&dirs.anns_file())?;
        let parts = build(videos, taxonomy)?;
        info!(
            acts = parts.acts.len(),
            sacts = parts.sacts.len(),
            hois = parts.hois.len(),
            "corpus parsed"
        );

        let builder = CacheBuilder::begin(dirs.cache_dir())?;
        builder.write_blob(BLOB_METADATA, &parts.metadata)?;
        builder.write_blob(BLOB_ACTS, &parts.acts)?;
        builder.write_blob(BLOB_SACTS, &parts.sacts)?;
        builder.write_blob(BLOB_SACT_TO_ACT, &parts.sact_to_act)?;
        builder.write_blob(BLOB_HOI_TO_SACT, &parts.hoi_to_sact)?;
        let hoi_dir = builder.hoi_dir();
        for hoi in &parts.hois {
            HoiStore::write_record(&hoi_dir, &hoi.id, hoi)?;
        }
        let cache = builder.commit()?;

        Self::from_cache(&cache)
    }

    fn from_cache(cache: &IndexCache) -> Result<Self> {
        cache.validate()?;
        Ok(Self {
            metadata: cache.read_blob(BLOB_METADATA)?,
            acts: cache.read_blob(BLOB_ACTS)?,
            sacts: cache.read_blob(BLOB_SACTS)?,
            sact_to_act: cache.read_blob(BLOB_SACT_TO_ACT)?,
            hoi_to_sact: cache.read_blob(BLOB_HOI_TO_SACT)?,
            hois: LazyRecordStore::open(cache.hoi_dir())?,
        })
    }

    // Key-based retrieval ---------------------------------------------------

    pub fn metadatum(&self, act_id: &str) -> Option<&Metadatum> {
        self.metadata.get(act_id)
    }

    pub fn act(&self, id: &str) -> Option<&Activity> {
        self.acts.get(id)
    }

    pub fn sact(&self, id: &str) -> Option<&SubActivity> {
        self.sacts.get(id)
    }

    /// Fetch one HOI record, deserializing it on first access.
    pub fn hoi(&self, id: &str) -> Result<Arc<Hoi>> {
        Ok(self.hois.get(id)?)
    }

    pub fn contains_hoi(&self, id: &str) -> bool {
        self.hois.contains(id)
    }

    pub fn act_ids(&self) -> impl Iterator<Item = &str> {
        self.acts.keys().map(String::as_str)
    }

    pub fn sact_ids(&self) -> impl Iterator<Item = &str> {
        self.sacts.keys().map(String::as_str)
    }

    /// HOI IDs in sorted order, without touching record payloads.
    pub fn hoi_ids(&self) -> impl Iterator<Item = &str> {
        self.hois.keys()
    }

    pub fn num_acts(&self) -> usize {
        self.acts.len()
    }

    pub fn num_sacts(&self) -> usize {
        self.sacts.len()
    }

    pub fn num_hois(&self) -> usize {
        self.hois.len()
    }

    // Cross-level tracing ---------------------------------------------------

    pub fn act_of_sact(&self, sact_id: &str) -> Option<&String> {
        self.sact_to_act.get(&sact_id.to_string())
    }

    pub fn sacts_of_act(&self, act_id: &str) -> BTreeSet<String> {
        self.sact_to_act.inverse_get(&act_id.to_string())
    }

    pub fn sact_of_hoi(&self, hoi_id: &str) -> Option<&String> {
        self.hoi_to_sact.get(&hoi_id.to_string())
    }

    pub fn hois_of_sact(&self, sact_id: &str) -> BTreeSet<String> {
        self.hoi_to_sact.inverse_get(&sact_id.to_string())
    }

    /// `hoi → act`, composed from the two single-hop maps.
    pub fn act_of_hoi(&self, hoi_id: &str) -> Option<&String> {
        self.sact_of_hoi(hoi_id)
            .and_then(|sact_id| self.act_of_sact(sact_id))
    }

    /// `act → hoi*`, composed from the two inverse directions.
    pub fn hois_of_act(&self, act_id: &str) -> BTreeSet<String> {
        self.sacts_of_act(act_id)
            .iter()
            .flat_map(|sact_id| self.hois_of_sact(sact_id))
            .collect()
    }
}

fn inconsistent(level: Level, id: &str, reason: impl Into<String>) -> IndexError {
    IndexError::CorpusInconsistent {
        level,
        id: id.to_string(),
        reason: reason.into(),
    }
}

/// Parse raw records into typed maps, resolving class IDs and checking
/// structural invariants. All-or-nothing: the first violation aborts the
/// whole build.
fn build(videos: Vec<corpus::RawVideo>, taxonomy: &Taxonomy) -> Result<Parts> {
    let mut metadata = HashMap::new();
    let mut acts = HashMap::new();
    let mut sacts = HashMap::new();
    let mut hois = Vec::new();
    let mut sact_to_act = Bidict::new();
    let mut hoi_to_sact = Bidict::new();

    for video in videos {
        let raw_act = video.activity;
        let act_id = raw_act.id.clone();

        if video.num_frames < 1 {
            return Err(inconsistent(Level::Act, &act_id, "frame count is zero"));
        }
        if video.duration <= 0.0 {
            return Err(inconsistent(Level::Act, &act_id, "non-positive duration"));
        }
        if acts.contains_key(&act_id) {
            return Err(inconsistent(Level::Act, &act_id, "duplicate activity id"));
        }

        let mut sact_ids = Vec::with_capacity(raw_act.sub_activities.len());
        for raw_sact in raw_act.sub_activities {
            let sact_id = raw_sact.id.clone();
            if sacts.contains_key(&sact_id) {
                return Err(inconsistent(
                    Level::Sact,
                    &sact_id,
                    "duplicate sub-activity id",
                ));
            }

            let mut hoi_ids = Vec::with_capacity(raw_sact.higher_order_interactions.len());
            let mut actor_ids = BTreeSet::new();
            let mut object_ids = BTreeSet::new();
            for raw_hoi in raw_sact.higher_order_interactions {
                let hoi_id = raw_hoi.id.clone();
                if hoi_to_sact.contains_key(&hoi_id) {
                    return Err(inconsistent(Level::Hoi, &hoi_id, "duplicate hoi id"));
                }
                if raw_hoi.time < raw_sact.start_time || raw_hoi.time >= raw_sact.end_time {
                    return Err(inconsistent(
                        Level::Hoi,
                        &hoi_id,
                        format!(
                            "timestamp {} outside sub-activity window [{}, {})",
                            raw_hoi.time, raw_sact.start_time, raw_sact.end_time
                        ),
                    ));
                }

                let actors = build_entities(raw_hoi.actors, EntityKind::Actor, taxonomy)?;
                let objects = build_entities(raw_hoi.objects, EntityKind::Object, taxonomy)?;
                actor_ids.extend(actors.iter().map(|e| e.id.clone()));
                object_ids.extend(objects.iter().map(|e| e.id.clone()));

                let hoi = Hoi {
                    id: hoi_id.clone(),
                    time: raw_hoi.time,
                    actors,
                    objects,
                    ias: build_unary(
                        raw_hoi.intransitive_actions,
                        UnaryKind::IntransitiveAction,
                        taxonomy,
                    )?,
                    tas: build_binary(
                        raw_hoi.transitive_actions,
                        BinaryKind::TransitiveAction,
                        taxonomy,
                    )?,
                    atts: build_unary(raw_hoi.attributes, UnaryKind::Attribute, taxonomy)?,
                    rels: build_binary(raw_hoi.relationships, BinaryKind::Relationship, taxonomy)?,
                };
                hoi_to_sact.set(hoi_id.clone(), sact_id.clone());
                hoi_ids.push(hoi_id);
                hois.push(hoi);
            }

            let sact = SubActivity {
                id: sact_id.clone(),
                cname: raw_sact.class_name.clone(),
                cid: taxonomy.class_id(Kind::SubActivity, &raw_sact.class_name)?,
                start: raw_sact.start_time,
                end: raw_sact.end_time,
                hoi_ids,
                actor_ids: actor_ids.into_iter().collect(),
                object_ids: object_ids.into_iter().collect(),
            };
            sact_to_act.set(sact_id.clone(), act_id.clone());
            sacts.insert(sact_id.clone(), sact);
            sact_ids.push(sact_id);
        }

        let act = Activity {
            id: act_id.clone(),
            cname: raw_act.class_name.clone(),
            cid: taxonomy.class_id(Kind::Activity, &raw_act.class_name)?,
            start: raw_act.start_time,
            end: raw_act.end_time,
            sact_ids,
        };
        metadata.insert(
            act_id.clone(),
            Metadatum {
                fname: video.file_name,
                num_frames: video.num_frames,
                width: video.width,
                height: video.height,
                duration: video.duration,
            },
        );
        acts.insert(act_id, act);
    }

    Ok(Parts {
        metadata,
        acts,
        sacts,
        hois,
        sact_to_act,
        hoi_to_sact,
    })
}

fn build_entities(
    raw: Vec<RawEntity>,
    kind: EntityKind,
    taxonomy: &Taxonomy,
) -> Result<Vec<Entity>> {
    let vocab_kind = match kind {
        EntityKind::Actor => Kind::Actor,
        EntityKind::Object => Kind::Object,
    };
    raw.into_iter()
        .map(|e| {
            let [x, y, width, height] = e.bbox;
            Ok(Entity {
                cid: taxonomy.class_id(vocab_kind, &e.class_name)?,
                id: e.id,
                kind,
                cname: e.class_name,
                bbox: BBox {
                    x,
                    y,
                    width,
                    height,
                },
            })
        })
        .collect()
}

fn build_unary(
    raw: Vec<RawUnaryPredicate>,
    kind: UnaryKind,
    taxonomy: &Taxonomy,
) -> Result<Vec<UnaryPredicate>> {
    let vocab_kind = match kind {
        UnaryKind::IntransitiveAction => Kind::IntransitiveAction,
        UnaryKind::Attribute => Kind::Attribute,
    };
    raw.into_iter()
        .map(|p| {
            Ok(UnaryPredicate {
                cid: taxonomy.class_id(vocab_kind, &p.class_name)?,
                kind,
                cname: p.class_name,
                source_id: p.source_id,
            })
        })
        .collect()
}

fn build_binary(
    raw: Vec<RawBinaryPredicate>,
    kind: BinaryKind,
    taxonomy: &Taxonomy,
) -> Result<Vec<BinaryPredicate>> {
    let vocab_kind = match kind {
        BinaryKind::TransitiveAction => Kind::TransitiveAction,
        BinaryKind::Relationship => Kind::Relationship,
    };
    raw.into_iter()
        .map(|p| {
            Ok(BinaryPredicate {
                cid: taxonomy.class_id(vocab_kind, &p.class_name)?,
                kind,
                cname: p.class_name,
                source_id: p.source_id,
                target_id: p.target_id,
            })
        })
        .collect()
}
