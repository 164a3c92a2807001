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

//! Class-vocabulary taxonomy
//!
//! Loads the per-kind class vocabularies, predicate signatures, the
//! sub-activity-class → activity-class mapping, and the few-shot
//! train/val/test partition. Class IDs are dataset-global and stable:
//! the ID of a class is its position in the sorted vocabulary of its
//! kind. The few-shot contiguous IDs are a derived, split-local
//! renumbering and must never be confused with the global IDs; the
//! conversion between the two lives here and nowhere else.

use crate::bidict::{Bidict, BidictError, OrderedBidict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Annotation kinds carrying a class vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Activity,
    SubActivity,
    Actor,
    Object,
    IntransitiveAction,
    TransitiveAction,
    Attribute,
    Relationship,
}

impl Kind {
    pub const ALL: [Kind; 8] = [
        Kind::Activity,
        Kind::SubActivity,
        Kind::Actor,
        Kind::Object,
        Kind::IntransitiveAction,
        Kind::TransitiveAction,
        Kind::Attribute,
        Kind::Relationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Activity => "activity",
            Kind::SubActivity => "sub_activity",
            Kind::Actor => "actor",
            Kind::Object => "object",
            Kind::IntransitiveAction => "intransitive_action",
            Kind::TransitiveAction => "transitive_action",
            Kind::Attribute => "attribute",
            Kind::Relationship => "relationship",
        }
    }

    /// Vocabulary artifact file name for this kind.
    fn artifact(&self) -> String {
        format!("{}.json", self.as_str())
    }

    fn is_unary_predicate(&self) -> bool {
        matches!(self, Kind::IntransitiveAction | Kind::Attribute)
    }

    fn is_binary_predicate(&self) -> bool {
        matches!(self, Kind::TransitiveAction | Kind::Relationship)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experimental split of the few-shot paradigm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typing signature of a predicate class. Source of truth for predicate
/// typing; preserved losslessly from the vocabulary artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    /// `(source kind)`
    Unary { src: String },
    /// `(source kind, target kind)`
    Binary { src: String, trg: String },
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("unknown class '{cname}' for kind {kind}")]
    UnknownClass { kind: Kind, cname: String },

    #[error("class id {cid} out of range for kind {kind} ({num_classes} classes)")]
    IndexOutOfRange {
        kind: Kind,
        cid: usize,
        num_classes: usize,
    },

    #[error("class '{cname}' ({kind}) is not in the {split} split")]
    ClassNotInSplit {
        kind: Kind,
        cname: String,
        split: Split,
    },

    #[error("class '{cname}' ({kind}) assigned to more than one split")]
    DuplicateClassAssignment { kind: Kind, cname: String },

    #[error("duplicate class '{cname}' in the {kind} vocabulary")]
    DuplicateClass { kind: Kind, cname: String },

    #[error("kind {0} has no few-shot partition")]
    NoFewShotPartition(Kind),

    #[error("kind {0} carries no signatures")]
    NoSignatures(Kind),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed taxonomy artifact {artifact}: {source}")]
    Json {
        artifact: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;

/// Grouped few-shot partition artifact (`few_shot.json`).
#[derive(Debug, Deserialize)]
struct FewShotFile {
    act: SplitLists,
    sact: SplitLists,
}

#[derive(Debug, Deserialize)]
struct SplitLists {
    train: Vec<String>,
    val: Vec<String>,
    test: Vec<String>,
}

/// Ordered class-name vocabularies for every annotation kind.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    /// Sorted, duplicate-free vocabulary per kind.
    vocabs: HashMap<Kind, Vec<String>>,
    /// Class name → global class ID, per kind.
    cids: HashMap<Kind, HashMap<String, usize>>,
    /// Predicate typing signatures, per predicate kind.
    signatures: HashMap<Kind, HashMap<String, Signature>>,
    /// Sub-activity class → activity class (many-to-one).
    sact_to_act: Bidict<String, String>,
    /// Few-shot split partition for activity and sub-activity classes.
    few_shot: HashMap<Kind, OrderedBidict<String, Split>>,
}

impl Taxonomy {
    /// Load every vocabulary artifact from the taxonomy directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut vocabs = HashMap::new();
        let mut cids = HashMap::new();
        let mut signatures = HashMap::new();

        for kind in Kind::ALL {
            let (vocab, sigs) = load_vocab(dir, kind)?;
            let by_name: HashMap<String, usize> = vocab
                .iter()
                .enumerate()
                .map(|(cid, name)| (name.clone(), cid))
                .collect();
            debug!(kind = %kind, classes = vocab.len(), "vocabulary loaded");
            vocabs.insert(kind, vocab);
            cids.insert(kind, by_name);
            if let Some(sigs) = sigs {
                signatures.insert(kind, sigs);
            }
        }

        let sact_to_act = load_sact_to_act(dir, &cids)?;
        let few_shot = load_few_shot(dir, &cids)?;

        Ok(Self {
            vocabs,
            cids,
            signatures,
            sact_to_act,
            few_shot,
        })
    }

    /// Global class ID of `cname`, its position in the sorted vocabulary.
    pub fn class_id(&self, kind: Kind, cname: &str) -> Result<usize> {
        self.cids[&kind]
            .get(cname)
            .copied()
            .ok_or_else(|| TaxonomyError::UnknownClass {
                kind,
                cname: cname.to_string(),
            })
    }

    /// Class name at global ID `cid`.
    pub fn class_name(&self, kind: Kind, cid: usize) -> Result<&str> {
        let vocab = &self.vocabs[&kind];
        vocab
            .get(cid)
            .map(String::as_str)
            .ok_or(TaxonomyError::IndexOutOfRange {
                kind,
                cid,
                num_classes: vocab.len(),
            })
    }

    /// Full vocabulary size of `kind` (unrestricted paradigm).
    pub fn num_classes(&self, kind: Kind) -> usize {
        self.vocabs[&kind].len()
    }

    /// Class-subset size of one few-shot split.
    pub fn num_classes_split(&self, kind: Kind, split: Split) -> Result<usize> {
        Ok(self.partition(kind)?.keys_of(&split).len())
    }

    /// Sorted vocabulary of `kind`.
    pub fn vocab(&self, kind: Kind) -> &[String] {
        &self.vocabs[&kind]
    }

    /// Typing signature of a predicate class.
    pub fn signature(&self, kind: Kind, cname: &str) -> Result<&Signature> {
        let sigs = self
            .signatures
            .get(&kind)
            .ok_or(TaxonomyError::NoSignatures(kind))?;
        sigs.get(cname).ok_or_else(|| TaxonomyError::UnknownClass {
            kind,
            cname: cname.to_string(),
        })
    }

    /// Activity class owning a sub-activity class.
    pub fn act_class_of(&self, sact_cname: &str) -> Result<&str> {
        self.sact_to_act
            .get(&sact_cname.to_string())
            .map(String::as_str)
            .ok_or_else(|| TaxonomyError::UnknownClass {
                kind: Kind::SubActivity,
                cname: sact_cname.to_string(),
            })
    }

    /// Sub-activity classes grouped under an activity class.
    pub fn sact_classes_of(&self, act_cname: &str) -> BTreeSet<String> {
        self.sact_to_act.inverse_get(&act_cname.to_string())
    }

    /// Global class IDs of one few-shot split, in contiguous-ID order.
    pub fn split_cids(&self, kind: Kind, split: Split) -> Result<Vec<usize>> {
        self.partition(kind)?
            .keys_of(&split)
            .iter()
            .map(|cname| self.class_id(kind, cname))
            .collect()
    }

    /// Dataset-global class ID → split-local contiguous ID.
    ///
    /// Errors with `ClassNotInSplit` when the class is outside the
    /// requested split; the conversion is never undefined.
    pub fn to_contiguous(&self, kind: Kind, split: Split, cid: usize) -> Result<usize> {
        let cname = self.class_name(kind, cid)?;
        let partition = self.partition(kind)?;
        match partition.lookup(&cname.to_string()) {
            Some((s, pos)) if *s == split => Ok(pos),
            _ => Err(TaxonomyError::ClassNotInSplit {
                kind,
                cname: cname.to_string(),
                split,
            }),
        }
    }

    /// Split-local contiguous ID → dataset-global class ID.
    pub fn to_global(&self, kind: Kind, split: Split, contiguous: usize) -> Result<usize> {
        let keys = self.partition(kind)?.keys_of(&split);
        let cname = keys
            .get(contiguous)
            .ok_or(TaxonomyError::IndexOutOfRange {
                kind,
                cid: contiguous,
                num_classes: keys.len(),
            })?;
        self.class_id(kind, cname)
    }

    fn partition(&self, kind: Kind) -> Result<&OrderedBidict<String, Split>> {
        self.few_shot
            .get(&kind)
            .ok_or(TaxonomyError::NoFewShotPartition(kind))
    }
}

/// Load one kind's vocabulary artifact: a grouped mapping from superclass
/// to member names (entity kinds) or member `(name, signature...)` tuples
/// (predicate kinds). Returns the sorted vocabulary, plus the signatures
/// for predicate kinds.
fn load_vocab(
    dir: &Path,
    kind: Kind,
) -> Result<(Vec<String>, Option<HashMap<String, Signature>>)> {
    let artifact = kind.artifact();
    let text = fs::read_to_string(dir.join(&artifact))?;

    let mut names = Vec::new();
    let mut signatures = None;

    if kind.is_unary_predicate() {
        let groups: BTreeMap<String, Vec<(String, String)>> =
            parse_artifact(&artifact, &text)?;
        let mut sigs = HashMap::new();
        for (name, src) in groups.into_values().flatten() {
            sigs.insert(name.clone(), Signature::Unary { src });
            names.push(name);
        }
        signatures = Some(sigs);
    } else if kind.is_binary_predicate() {
        let groups: BTreeMap<String, Vec<(String, String, String)>> =
            parse_artifact(&artifact, &text)?;
        let mut sigs = HashMap::new();
        for (name, src, trg) in groups.into_values().flatten() {
            sigs.insert(name.clone(), Signature::Binary { src, trg });
            names.push(name);
        }
        signatures = Some(sigs);
    } else {
        let groups: BTreeMap<String, Vec<String>> = parse_artifact(&artifact, &text)?;
        names = groups.into_values().flatten().collect();
    }

    names.sort_unstable();
    if let Some(window) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(TaxonomyError::DuplicateClass {
            kind,
            cname: window[0].clone(),
        });
    }
    Ok((names, signatures))
}

fn load_sact_to_act(
    dir: &Path,
    cids: &HashMap<Kind, HashMap<String, usize>>,
) -> Result<Bidict<String, String>> {
    let artifact = "act_sact.json";
    let text = fs::read_to_string(dir.join(artifact))?;
    let groups: BTreeMap<String, Vec<String>> = parse_artifact(artifact, &text)?;

    let mut map = Bidict::new();
    for (act_cname, sact_cnames) in groups {
        require_known(cids, Kind::Activity, &act_cname)?;
        for sact_cname in sact_cnames {
            require_known(cids, Kind::SubActivity, &sact_cname)?;
            map.set(sact_cname, act_cname.clone());
        }
    }
    Ok(map)
}

fn load_few_shot(
    dir: &Path,
    cids: &HashMap<Kind, HashMap<String, usize>>,
) -> Result<HashMap<Kind, OrderedBidict<String, Split>>> {
    let artifact = "few_shot.json";
    let text = fs::read_to_string(dir.join(artifact))?;
    let file: FewShotFile = parse_artifact(artifact, &text)?;

    let mut few_shot = HashMap::new();
    for (kind, lists) in [(Kind::Activity, file.act), (Kind::SubActivity, file.sact)] {
        let mut partitions = Vec::new();
        for (split, mut cnames) in [
            (Split::Train, lists.train),
            (Split::Val, lists.val),
            (Split::Test, lists.test),
        ] {
            for cname in &cnames {
                require_known(cids, kind, cname)?;
            }
            // Contiguous IDs follow global-ID order within the split.
            cnames.sort_unstable_by_key(|cname| cids[&kind][cname]);
            partitions.push((split, cnames));
        }
        let partition = OrderedBidict::from_partitions(partitions).map_err(|e| match e {
            BidictError::DuplicateAssignment(cname) => {
                TaxonomyError::DuplicateClassAssignment { kind, cname }
            }
            BidictError::KeyNotFound(cname) => TaxonomyError::UnknownClass { kind, cname },
        })?;
        few_shot.insert(kind, partition);
    }
    Ok(few_shot)
}

fn require_known(
    cids: &HashMap<Kind, HashMap<String, usize>>,
    kind: Kind,
    cname: &str,
) -> Result<()> {
    if cids[&kind].contains_key(cname) {
        Ok(())
    } else {
        Err(TaxonomyError::UnknownClass {
            kind,
            cname: cname.to_string(),
        })
    }
}

fn parse_artifact<T: serde::de::DeserializeOwned>(artifact: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| TaxonomyError::Json {
        artifact: artifact.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// Taxonomy directory shared with the dataset fixtures.
    fn write_fixture() -> TempDir {
        let dir = tempdir().unwrap();
        crate::fixtures::write_taxonomy(dir.path());
        dir
    }

    #[test]
    fn test_class_id_roundtrip() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        // Sorted vocabulary: chores=0, meal_prep=1.
        assert_eq!(tax.class_id(Kind::Activity, "chores").unwrap(), 0);
        assert_eq!(tax.class_id(Kind::Activity, "meal_prep").unwrap(), 1);
        assert_eq!(tax.class_name(Kind::Activity, 1).unwrap(), "meal_prep");
        assert_eq!(tax.num_classes(Kind::SubActivity), 3);
    }

    #[test]
    fn test_unknown_class() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();
        assert!(matches!(
            tax.class_id(Kind::Actor, "unicorn"),
            Err(TaxonomyError::UnknownClass { kind: Kind::Actor, .. })
        ));
    }

    #[test]
    fn test_class_name_out_of_range() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();
        assert!(matches!(
            tax.class_name(Kind::Object, 99),
            Err(TaxonomyError::IndexOutOfRange { cid: 99, .. })
        ));
    }

    #[test]
    fn test_signatures_preserved() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        assert_eq!(
            tax.signature(Kind::TransitiveAction, "hold").unwrap(),
            &Signature::Binary {
                src: "actor".to_string(),
                trg: "object".to_string()
            }
        );
        assert_eq!(
            tax.signature(Kind::IntransitiveAction, "walk").unwrap(),
            &Signature::Unary {
                src: "actor".to_string()
            }
        );
        assert!(matches!(
            tax.signature(Kind::Actor, "chef"),
            Err(TaxonomyError::NoSignatures(Kind::Actor))
        ));
    }

    #[test]
    fn test_sact_act_class_mapping() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        assert_eq!(tax.act_class_of("cooking").unwrap(), "meal_prep");
        let grouped = tax.sact_classes_of("meal_prep");
        assert_eq!(
            grouped.into_iter().collect::<Vec<_>>(),
            vec!["cooking".to_string(), "plating".to_string()]
        );
    }

    #[test]
    fn test_remap_involution() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        for split in Split::ALL {
            for cid in tax.split_cids(Kind::SubActivity, split).unwrap() {
                let local = tax.to_contiguous(Kind::SubActivity, split, cid).unwrap();
                let back = tax.to_global(Kind::SubActivity, split, local).unwrap();
                assert_eq!(back, cid);
            }
        }
    }

    #[test]
    fn test_contiguous_ids_are_contiguous() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        let locals: Vec<usize> = tax
            .split_cids(Kind::SubActivity, Split::Train)
            .unwrap()
            .into_iter()
            .map(|cid| {
                tax.to_contiguous(Kind::SubActivity, Split::Train, cid)
                    .unwrap()
            })
            .collect();
        assert_eq!(locals, vec![0, 1]);
    }

    #[test]
    fn test_remap_outside_split_is_error() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        // "cleaning" is in val, not train.
        let cid = tax.class_id(Kind::SubActivity, "cleaning").unwrap();
        assert!(matches!(
            tax.to_contiguous(Kind::SubActivity, Split::Train, cid),
            Err(TaxonomyError::ClassNotInSplit { .. })
        ));
    }

    #[test]
    fn test_num_classes_split() {
        let dir = write_fixture();
        let tax = Taxonomy::load(dir.path()).unwrap();

        assert_eq!(
            tax.num_classes_split(Kind::SubActivity, Split::Train).unwrap(),
            2
        );
        assert_eq!(tax.num_classes_split(Kind::Activity, Split::Test).unwrap(), 0);
        assert!(matches!(
            tax.num_classes_split(Kind::Actor, Split::Train),
            Err(TaxonomyError::NoFewShotPartition(Kind::Actor))
        ));
    }

    #[test]
    fn test_duplicate_split_assignment_rejected() {
        let dir = write_fixture();
        fs::write(
            dir.path().join("few_shot.json"),
            r#"{
                "act": {"train": ["meal_prep"], "val": ["meal_prep"], "test": []},
                "sact": {"train": [], "val": [], "test": []}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            Taxonomy::load(dir.path()),
            Err(TaxonomyError::DuplicateClassAssignment { .. })
        ));
    }

    #[test]
    fn test_few_shot_unknown_class_rejected() {
        let dir = write_fixture();
        fs::write(
            dir.path().join("few_shot.json"),
            r#"{
                "act": {"train": ["skydiving"], "val": [], "test": []},
                "sact": {"train": [], "val": [], "test": []}
            }"#,
        )
        .unwrap();
        assert!(matches!(
            Taxonomy::load(dir.path()),
            Err(TaxonomyError::UnknownClass { .. })
        ));
    }
}
