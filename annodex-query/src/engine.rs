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

//! Query engine for the annotation corpus
//!
//! [`Annodex`] composes the taxonomy and the annotation index into the
//! public query surface. Each level has one retrieval operation with an
//! open set of optional criteria; every supplied criterion independently
//! resolves to a candidate ID set at that level and the result is the
//! intersection of all of them — conjunctive semantics, never union.
//! Zero criteria is a valid fetch-all, and an empty candidate set simply
//! intersects to an empty result.
//!
//! **Thread safety:** `Annodex` is built once and immutable afterwards;
//! all queries are pure reads and safe to run concurrently (HOI records
//! memoize behind a fill-once cache).

use annodex_core::{DatasetDirs, Hoi, Level, Metadatum, SubActivity};
use annodex_index::{IndexError, Kind, Lookup, Split, Taxonomy, TaxonomyError};
use annodex_storage::StoreError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum QueryError {
    /// Mutually exclusive selectors supplied together (or none where
    /// exactly one is required).
    #[error("invalid criteria combination: {0}")]
    InvalidCriteriaCombination(String),

    /// Sanity-checked sort over IDs spanning more than one parent.
    #[error("cannot sort {level} ids across parents {parents:?}")]
    CrossParentSort { level: Level, parents: Vec<String> },

    /// A resolved canonical path does not exist on disk.
    #[error("path does not exist: {0}")]
    PathMissing(PathBuf),

    #[error("unknown {level} id '{id}'")]
    UnknownId { level: Level, id: String },

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// Facade over one loaded corpus: taxonomy + index + directory layout.
///
/// A successful [`Annodex::open`] is the only unloaded→ready transition;
/// no partially-loaded value is ever observable.
pub struct Annodex {
    dirs: DatasetDirs,
    taxonomy: Taxonomy,
    lookup: Lookup,
}

impl Annodex {
    /// Load taxonomy and index from a dataset root. All-or-nothing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let dirs = DatasetDirs::new(root);
        let taxonomy = Taxonomy::load(&dirs.taxonomy_dir())?;
        let lookup = Lookup::load(&dirs, &taxonomy)?;
        info!(
            acts = lookup.num_acts(),
            sacts = lookup.num_sacts(),
            hois = lookup.num_hois(),
            "corpus ready"
        );
        Ok(Self {
            dirs,
            taxonomy,
            lookup,
        })
    }

    pub fn dirs(&self) -> &DatasetDirs {
        &self.dirs
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }

    // Filtered retrieval ----------------------------------------------------

    pub fn query_acts(&self) -> ActQuery<'_> {
        ActQuery {
            dex: self,
            cnames: None,
            ids_sact: None,
            ids_hoi: None,
        }
    }

    pub fn query_sacts(&self) -> SactQuery<'_> {
        SactQuery {
            dex: self,
            cnames: None,
            ids_act: None,
            ids_hoi: None,
            cnames_actor: None,
            cnames_object: None,
            cnames_ia: None,
            cnames_ta: None,
            cnames_att: None,
            cnames_rel: None,
        }
    }

    pub fn query_hois(&self) -> HoiQuery<'_> {
        HoiQuery {
            dex: self,
            ids_act: None,
            ids_sact: None,
            cnames_actor: None,
            cnames_object: None,
            cnames_ia: None,
            cnames_ta: None,
            cnames_att: None,
            cnames_rel: None,
        }
    }

    // Batch record fetch ----------------------------------------------------

    pub fn get_metadata(&self, act_ids: &[String]) -> Result<Vec<&Metadatum>> {
        act_ids
            .iter()
            .map(|id| {
                self.lookup.metadatum(id).ok_or_else(|| QueryError::UnknownId {
                    level: Level::Act,
                    id: id.clone(),
                })
            })
            .collect()
    }

    pub fn get_acts(&self, ids: &[String]) -> Result<Vec<&annodex_core::Activity>> {
        ids.iter()
            .map(|id| {
                self.lookup.act(id).ok_or_else(|| QueryError::UnknownId {
                    level: Level::Act,
                    id: id.clone(),
                })
            })
            .collect()
    }

    pub fn get_sacts(&self, ids: &[String]) -> Result<Vec<&SubActivity>> {
        ids.iter()
            .map(|id| {
                self.lookup.sact(id).ok_or_else(|| QueryError::UnknownId {
                    level: Level::Sact,
                    id: id.clone(),
                })
            })
            .collect()
    }

    pub fn get_hois(&self, ids: &[String]) -> Result<Vec<Arc<Hoi>>> {
        ids.iter()
            .map(|id| {
                if !self.lookup.contains_hoi(id) {
                    return Err(QueryError::UnknownId {
                        level: Level::Hoi,
                        id: id.clone(),
                    });
                }
                Ok(self.lookup.hoi(id)?)
            })
            .collect()
    }

    // Class-ID surface ------------------------------------------------------

    /// Global class IDs of `kind`: the full vocabulary, or one few-shot
    /// split's subset (in contiguous-ID order).
    pub fn get_cids(&self, kind: Kind, split: Option<Split>) -> Result<Vec<usize>> {
        match split {
            None => Ok((0..self.taxonomy.num_classes(kind)).collect()),
            Some(split) => Ok(self.taxonomy.split_cids(kind, split)?),
        }
    }

    /// Dataset-global → split-local contiguous class ID (few-shot only).
    pub fn to_contiguous(&self, kind: Kind, split: Split, cid: usize) -> Result<usize> {
        Ok(self.taxonomy.to_contiguous(kind, split, cid)?)
    }

    /// Split-local contiguous → dataset-global class ID (few-shot only).
    pub fn to_global(&self, kind: Kind, split: Split, contiguous: usize) -> Result<usize> {
        Ok(self.taxonomy.to_global(kind, split, contiguous)?)
    }

    // Temporal sort ---------------------------------------------------------

    /// Sort sub-activity IDs by their `start` time.
    ///
    /// With `sanity`, all IDs must share one immediate parent activity;
    /// mixing parents produces a nonsensical order and is rejected.
    pub fn sort_sacts(&self, ids: &[String], sanity: bool) -> Result<Vec<String>> {
        let mut entries = Vec::with_capacity(ids.len());
        let mut parents = BTreeSet::new();
        for id in ids {
            let sact = self.lookup.sact(id).ok_or_else(|| QueryError::UnknownId {
                level: Level::Sact,
                id: id.clone(),
            })?;
            if sanity {
                if let Some(parent) = self.lookup.act_of_sact(id) {
                    parents.insert(parent.clone());
                }
            }
            entries.push((id.clone(), sact.start));
        }
        if sanity && parents.len() > 1 {
            return Err(QueryError::CrossParentSort {
                level: Level::Sact,
                parents: parents.into_iter().collect(),
            });
        }
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(entries.into_iter().map(|(id, _)| id).collect())
    }

    /// Sort HOI IDs by their `time`. `sanity` as in [`Self::sort_sacts`],
    /// against the immediate parent sub-activity.
    pub fn sort_hois(&self, ids: &[String], sanity: bool) -> Result<Vec<String>> {
        let mut entries = Vec::with_capacity(ids.len());
        let mut parents = BTreeSet::new();
        for id in ids {
            if !self.lookup.contains_hoi(id) {
                return Err(QueryError::UnknownId {
                    level: Level::Hoi,
                    id: id.clone(),
                });
            }
            if sanity {
                if let Some(parent) = self.lookup.sact_of_hoi(id) {
                    parents.insert(parent.clone());
                }
            }
            let hoi = self.lookup.hoi(id)?;
            entries.push((id.clone(), hoi.time));
        }
        if sanity && parents.len() > 1 {
            return Err(QueryError::CrossParentSort {
                level: Level::Hoi,
                parents: parents.into_iter().collect(),
            });
        }
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(entries.into_iter().map(|(id, _)| id).collect())
    }

    // Criterion helpers -----------------------------------------------------

    /// Validate a class-name list against one vocabulary.
    fn wanted(&self, kind: Kind, cnames: &[String]) -> Result<BTreeSet<String>> {
        for cname in cnames {
            self.taxonomy.class_id(kind, cname)?;
        }
        Ok(cnames.iter().cloned().collect())
    }

    fn sact_of_hoi(&self, hoi_id: &str) -> Result<String> {
        self.lookup
            .sact_of_hoi(hoi_id)
            .cloned()
            .ok_or_else(|| QueryError::UnknownId {
                level: Level::Hoi,
                id: hoi_id.to_string(),
            })
    }
}

/// Intersection of all supplied candidate sets; `None` when no criterion
/// was supplied at all.
fn intersect_all(sets: Vec<BTreeSet<String>>) -> Option<BTreeSet<String>> {
    let mut iter = sets.into_iter();
    let first = iter.next()?;
    Some(iter.fold(first, |acc, set| acc.intersection(&set).cloned().collect()))
}

fn collect_cnames<I, S>(cnames: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Some(cnames.into_iter().map(Into::into).collect())
}

// ============================================================================
// Activity-level query
// ============================================================================

/// Filtered activity retrieval. Zero criteria returns every activity ID,
/// sorted.
pub struct ActQuery<'a> {
    dex: &'a Annodex,
    cnames: Option<Vec<String>>,
    ids_sact: Option<Vec<String>>,
    ids_hoi: Option<Vec<String>>,
}

impl<'a> ActQuery<'a> {
    /// Same-level: activity class name ∈ the given set.
    pub fn cnames<I, S>(mut self, cnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cnames = collect_cnames(cnames);
        self
    }

    /// Bottom-up: activities owning any of these sub-activities.
    pub fn ids_sact<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_sact = collect_cnames(ids);
        self
    }

    /// Bottom-up: activities owning any of these HOIs.
    pub fn ids_hoi<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_hoi = collect_cnames(ids);
        self
    }

    pub fn execute(self) -> Result<Vec<String>> {
        let lookup = self.dex.lookup();
        let mut criteria = Vec::new();

        if let Some(cnames) = &self.cnames {
            let wanted = self.dex.wanted(Kind::Activity, cnames)?;
            let set = lookup
                .act_ids()
                .filter(|id| {
                    lookup
                        .act(id)
                        .is_some_and(|act| wanted.contains(&act.cname))
                })
                .map(str::to_string)
                .collect();
            criteria.push(set);
        }

        if let Some(ids) = &self.ids_sact {
            let mut set = BTreeSet::new();
            for id in ids {
                let act = lookup
                    .act_of_sact(id)
                    .ok_or_else(|| QueryError::UnknownId {
                        level: Level::Sact,
                        id: id.clone(),
                    })?;
                set.insert(act.clone());
            }
            criteria.push(set);
        }

        if let Some(ids) = &self.ids_hoi {
            let mut set = BTreeSet::new();
            for id in ids {
                let act = lookup.act_of_hoi(id).ok_or_else(|| QueryError::UnknownId {
                    level: Level::Hoi,
                    id: id.clone(),
                })?;
                set.insert(act.clone());
            }
            criteria.push(set);
        }

        match intersect_all(criteria) {
            Some(set) => Ok(set.into_iter().collect()),
            None => {
                let mut all: Vec<String> = lookup.act_ids().map(str::to_string).collect();
                all.sort_unstable();
                Ok(all)
            }
        }
    }
}

// ============================================================================
// Sub-activity-level query
// ============================================================================

/// Filtered sub-activity retrieval.
///
/// Entity/predicate criteria delegate to the HOI-level query and trace
/// upward, so each predicate's semantics has exactly one implementation.
pub struct SactQuery<'a> {
    dex: &'a Annodex,
    cnames: Option<Vec<String>>,
    ids_act: Option<Vec<String>>,
    ids_hoi: Option<Vec<String>>,
    cnames_actor: Option<Vec<String>>,
    cnames_object: Option<Vec<String>>,
    cnames_ia: Option<Vec<String>>,
    cnames_ta: Option<Vec<String>>,
    cnames_att: Option<Vec<String>>,
    cnames_rel: Option<Vec<String>>,
}

macro_rules! cname_setter {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $name<I, S>(mut self, cnames: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.$name = collect_cnames(cnames);
            self
        }
    };
}

impl<'a> SactQuery<'a> {
    /// Same-level: sub-activity class name ∈ the given set.
    pub fn cnames<I, S>(mut self, cnames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cnames = collect_cnames(cnames);
        self
    }

    /// Top-down: sub-activities belonging to any of these activities.
    pub fn ids_act<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_act = collect_cnames(ids);
        self
    }

    /// Bottom-up: sub-activities owning any of these HOIs.
    pub fn ids_hoi<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_hoi = collect_cnames(ids);
        self
    }

    cname_setter!(cnames_actor, "Sub-activities containing an HOI with an actor of these classes.");
    cname_setter!(cnames_object, "Sub-activities containing an HOI with an object of these classes.");
    cname_setter!(cnames_ia, "Sub-activities containing an HOI with an intransitive action of these classes.");
    cname_setter!(cnames_ta, "Sub-activities containing an HOI with a transitive action of these classes.");
    cname_setter!(cnames_att, "Sub-activities containing an HOI with an attribute of these classes.");
    cname_setter!(cnames_rel, "Sub-activities containing an HOI with a relationship of these classes.");

    pub fn execute(self) -> Result<Vec<String>> {
        let lookup = self.dex.lookup();
        let mut criteria = Vec::new();

        if let Some(cnames) = &self.cnames {
            let wanted = self.dex.wanted(Kind::SubActivity, cnames)?;
            let set = lookup
                .sact_ids()
                .filter(|id| {
                    lookup
                        .sact(id)
                        .is_some_and(|sact| wanted.contains(&sact.cname))
                })
                .map(str::to_string)
                .collect();
            criteria.push(set);
        }

        if let Some(ids) = &self.ids_act {
            let mut set = BTreeSet::new();
            for id in ids {
                if lookup.act(id).is_none() {
                    return Err(QueryError::UnknownId {
                        level: Level::Act,
                        id: id.clone(),
                    });
                }
                set.extend(lookup.sacts_of_act(id));
            }
            criteria.push(set);
        }

        if let Some(ids) = &self.ids_hoi {
            let mut set = BTreeSet::new();
            for id in ids {
                set.insert(self.dex.sact_of_hoi(id)?);
            }
            criteria.push(set);
        }

        // Each entity/predicate criterion resolves independently at the
        // HOI level, then traces up to this level.
        type Delegate<'b> = fn(HoiQuery<'b>, Vec<String>) -> HoiQuery<'b>;
        let delegated: [(Option<Vec<String>>, Delegate<'a>); 6] = [
            (self.cnames_actor.clone(), |q, c| q.cnames_actor(c)),
            (self.cnames_object.clone(), |q, c| q.cnames_object(c)),
            (self.cnames_ia.clone(), |q, c| q.cnames_ia(c)),
            (self.cnames_ta.clone(), |q, c| q.cnames_ta(c)),
            (self.cnames_att.clone(), |q, c| q.cnames_att(c)),
            (self.cnames_rel.clone(), |q, c| q.cnames_rel(c)),
        ];
        for (cnames, apply) in delegated {
            if let Some(cnames) = cnames {
                let hoi_ids = apply(self.dex.query_hois(), cnames).execute()?;
                let mut set = BTreeSet::new();
                for id in &hoi_ids {
                    set.insert(self.dex.sact_of_hoi(id)?);
                }
                criteria.push(set);
            }
        }

        match intersect_all(criteria) {
            Some(set) => Ok(set.into_iter().collect()),
            None => {
                let mut all: Vec<String> = lookup.sact_ids().map(str::to_string).collect();
                all.sort_unstable();
                Ok(all)
            }
        }
    }
}

// ============================================================================
// HOI-level query
// ============================================================================

/// Filtered HOI retrieval. The one authoritative home of entity and
/// predicate class criteria.
pub struct HoiQuery<'a> {
    dex: &'a Annodex,
    ids_act: Option<Vec<String>>,
    ids_sact: Option<Vec<String>>,
    cnames_actor: Option<Vec<String>>,
    cnames_object: Option<Vec<String>>,
    cnames_ia: Option<Vec<String>>,
    cnames_ta: Option<Vec<String>>,
    cnames_att: Option<Vec<String>>,
    cnames_rel: Option<Vec<String>>,
}

impl<'a> HoiQuery<'a> {
    /// Top-down: HOIs under any of these activities.
    pub fn ids_act<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_act = collect_cnames(ids);
        self
    }

    /// Top-down: HOIs under any of these sub-activities.
    pub fn ids_sact<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids_sact = collect_cnames(ids);
        self
    }

    cname_setter!(cnames_actor, "HOIs observing an actor of these classes.");
    cname_setter!(cnames_object, "HOIs observing an object of these classes.");
    cname_setter!(cnames_ia, "HOIs observing an intransitive action of these classes.");
    cname_setter!(cnames_ta, "HOIs observing a transitive action of these classes.");
    cname_setter!(cnames_att, "HOIs observing an attribute of these classes.");
    cname_setter!(cnames_rel, "HOIs observing a relationship of these classes.");

    pub fn execute(self) -> Result<Vec<String>> {
        let lookup = self.dex.lookup();
        let mut criteria = Vec::new();

        if let Some(ids) = &self.ids_act {
            let mut set = BTreeSet::new();
            for id in ids {
                if lookup.act(id).is_none() {
                    return Err(QueryError::UnknownId {
                        level: Level::Act,
                        id: id.clone(),
                    });
                }
                set.extend(lookup.hois_of_act(id));
            }
            criteria.push(set);
        }

        if let Some(ids) = &self.ids_sact {
            let mut set = BTreeSet::new();
            for id in ids {
                if lookup.sact(id).is_none() {
                    return Err(QueryError::UnknownId {
                        level: Level::Sact,
                        id: id.clone(),
                    });
                }
                set.extend(lookup.hois_of_sact(id));
            }
            criteria.push(set);
        }

        type Matcher = fn(&Hoi, &BTreeSet<String>) -> bool;
        let content: [(&Option<Vec<String>>, Kind, Matcher); 6] = [
            (&self.cnames_actor, Kind::Actor, |hoi, wanted| {
                hoi.actors.iter().any(|e| wanted.contains(&e.cname))
            }),
            (&self.cnames_object, Kind::Object, |hoi, wanted| {
                hoi.objects.iter().any(|e| wanted.contains(&e.cname))
            }),
            (&self.cnames_ia, Kind::IntransitiveAction, |hoi, wanted| {
                hoi.ias.iter().any(|p| wanted.contains(&p.cname))
            }),
            (&self.cnames_ta, Kind::TransitiveAction, |hoi, wanted| {
                hoi.tas.iter().any(|p| wanted.contains(&p.cname))
            }),
            (&self.cnames_att, Kind::Attribute, |hoi, wanted| {
                hoi.atts.iter().any(|p| wanted.contains(&p.cname))
            }),
            (&self.cnames_rel, Kind::Relationship, |hoi, wanted| {
                hoi.rels.iter().any(|p| wanted.contains(&p.cname))
            }),
        ];

        for (cnames, kind, matches) in content {
            if let Some(cnames) = cnames {
                let wanted = self.dex.wanted(kind, cnames)?;
                let mut set = BTreeSet::new();
                for id in lookup.hoi_ids() {
                    let hoi = lookup.hoi(id)?;
                    if matches(&hoi, &wanted) {
                        set.insert(id.to_string());
                    }
                }
                criteria.push(set);
            }
        }

        match intersect_all(criteria) {
            Some(set) => Ok(set.into_iter().collect()),
            None => Ok(lookup.hoi_ids().map(str::to_string).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annodex_index::fixtures;
    use tempfile::TempDir;

    fn open_fixture() -> (TempDir, Annodex) {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();
        (root, dex)
    }

    #[test]
    fn test_empty_criteria_returns_all_sorted() {
        let (_root, dex) = open_fixture();
        assert_eq!(dex.query_acts().execute().unwrap(), vec!["A1", "A2"]);
        assert_eq!(
            dex.query_sacts().execute().unwrap(),
            vec!["S1", "S2", "S3"]
        );
        assert_eq!(
            dex.query_hois().execute().unwrap(),
            vec!["H1", "H2", "H3", "H4"]
        );
    }

    #[test]
    fn test_sact_same_level_class_filter() {
        // A1 [0,100) holds S1 cooking [10,50) and S2 cleaning [50,90);
        // only S1 is a cooking sub-activity.
        let (_root, dex) = open_fixture();
        let ids = dex.query_sacts().cnames(["cooking"]).execute().unwrap();
        assert_eq!(ids, vec!["S1"]);
    }

    #[test]
    fn test_hoi_actor_filter_and_upward_trace() {
        let (_root, dex) = open_fixture();
        let ids = dex.query_hois().cnames_actor(["chef"]).execute().unwrap();
        assert_eq!(ids, vec!["H1"]);

        assert_eq!(dex.lookup().sact_of_hoi("H1"), Some(&"S1".to_string()));
        assert_eq!(dex.lookup().act_of_hoi("H1"), Some(&"A1".to_string()));
    }

    #[test]
    fn test_intersection_law() {
        let (_root, dex) = open_fixture();

        let both = dex
            .query_sacts()
            .cnames(["cleaning"])
            .ids_act(["A1"])
            .execute()
            .unwrap();
        let only_cname = dex.query_sacts().cnames(["cleaning"]).execute().unwrap();
        let only_act = dex.query_sacts().ids_act(["A1"]).execute().unwrap();

        let expected: Vec<String> = only_cname
            .iter()
            .filter(|id| only_act.contains(id))
            .cloned()
            .collect();
        assert_eq!(both, expected);
        assert_eq!(both, vec!["S2"]);
    }

    #[test]
    fn test_entity_criterion_delegates_to_hoi_level() {
        let (_root, dex) = open_fixture();

        // "assistant" appears in H2 (S1), H3 (S2), H4 (S3).
        let ids = dex
            .query_sacts()
            .cnames_actor(["assistant"])
            .execute()
            .unwrap();
        assert_eq!(ids, vec!["S1", "S2", "S3"]);

        // Independent criteria intersect at this level: "chef" appears
        // only in H1 (S1), "walk" in H2 (S1) and H4 (S3).
        let ids = dex
            .query_sacts()
            .cnames_actor(["chef"])
            .cnames_ia(["walk"])
            .execute()
            .unwrap();
        assert_eq!(ids, vec!["S1"]);
    }

    #[test]
    fn test_empty_candidate_set_intersects_to_empty() {
        let (_root, dex) = open_fixture();
        // "plating" is a known class with no instances.
        let ids = dex
            .query_sacts()
            .cnames(["plating"])
            .ids_act(["A1"])
            .execute()
            .unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_unknown_class_in_criterion() {
        let (_root, dex) = open_fixture();
        assert!(matches!(
            dex.query_hois().cnames_actor(["unicorn"]).execute(),
            Err(QueryError::Taxonomy(TaxonomyError::UnknownClass { .. }))
        ));
    }

    #[test]
    fn test_unknown_id_in_criterion() {
        let (_root, dex) = open_fixture();
        assert!(matches!(
            dex.query_sacts().ids_act(["A9"]).execute(),
            Err(QueryError::UnknownId {
                level: Level::Act,
                ..
            })
        ));
    }

    #[test]
    fn test_bottom_up_act_query() {
        let (_root, dex) = open_fixture();
        let ids = dex.query_acts().ids_hoi(["H3", "H4"]).execute().unwrap();
        assert_eq!(ids, vec!["A1", "A2"]);

        let ids = dex
            .query_acts()
            .cnames(["chores"])
            .ids_hoi(["H3", "H4"])
            .execute()
            .unwrap();
        assert_eq!(ids, vec!["A2"]);
    }

    #[test]
    fn test_top_down_hoi_query() {
        let (_root, dex) = open_fixture();
        let ids = dex.query_hois().ids_sact(["S1"]).execute().unwrap();
        assert_eq!(ids, vec!["H1", "H2"]);

        let ids = dex
            .query_hois()
            .ids_act(["A1"])
            .cnames_att(["dirty"])
            .execute()
            .unwrap();
        assert_eq!(ids, vec!["H1", "H3"]);
    }

    #[test]
    fn test_batch_fetch() {
        let (_root, dex) = open_fixture();
        let metas = dex.get_metadata(&["A1".to_string(), "A2".to_string()]).unwrap();
        assert_eq!(metas[0].fname, "v1.mp4");
        assert_eq!(metas[1].duration, 80.0);

        let hois = dex.get_hois(&["H1".to_string()]).unwrap();
        assert_eq!(hois[0].rels[0].cname, "behind");

        assert!(matches!(
            dex.get_sacts(&["S9".to_string()]),
            Err(QueryError::UnknownId {
                level: Level::Sact,
                ..
            })
        ));
    }

    #[test]
    fn test_sort_by_time() {
        let (_root, dex) = open_fixture();
        let ids = vec!["S2".to_string(), "S1".to_string()];
        assert_eq!(dex.sort_sacts(&ids, true).unwrap(), vec!["S1", "S2"]);

        let ids = vec!["H2".to_string(), "H1".to_string()];
        assert_eq!(dex.sort_hois(&ids, true).unwrap(), vec!["H1", "H2"]);
    }

    #[test]
    fn test_cross_parent_sort_rejected() {
        let (_root, dex) = open_fixture();
        let ids = vec!["S1".to_string(), "S3".to_string()];
        assert!(matches!(
            dex.sort_sacts(&ids, true),
            Err(QueryError::CrossParentSort {
                level: Level::Sact,
                ..
            })
        ));
        // Without the sanity check the sort is by raw start time.
        assert_eq!(dex.sort_sacts(&ids, false).unwrap(), vec!["S3", "S1"]);
    }

    #[test]
    fn test_class_id_surface() {
        let (_root, dex) = open_fixture();
        assert_eq!(
            dex.get_cids(Kind::SubActivity, None).unwrap(),
            vec![0, 1, 2]
        );
        // Train split of sub-activities: cooking (1), plating (2).
        assert_eq!(
            dex.get_cids(Kind::SubActivity, Some(Split::Train)).unwrap(),
            vec![1, 2]
        );
        let local = dex.to_contiguous(Kind::SubActivity, Split::Train, 2).unwrap();
        assert_eq!(local, 1);
        assert_eq!(
            dex.to_global(Kind::SubActivity, Split::Train, local).unwrap(),
            2
        );
    }
}
