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

//! Corpus statistics
//!
//! Per-class instance counts and durations, aggregated through the
//! public query surface only. Vectors are indexed by global class ID,
//! so every class appears even at count zero.

use crate::engine::{Annodex, Result};
use annodex_index::Kind;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Count and total duration per class of one temporal level.
#[derive(Debug, Clone, Serialize)]
pub struct LevelStats {
    /// Instances per class, indexed by global class ID.
    pub counts: Vec<usize>,
    /// Summed window length per class, seconds.
    pub durations: Vec<f64>,
}

impl LevelStats {
    fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
            durations: vec![0.0; num_classes],
        }
    }

    fn record(&mut self, cid: usize, duration: f64) {
        self.counts[cid] += 1;
        self.durations[cid] += duration;
    }
}

/// Aggregate statistics over one loaded corpus.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub num_acts: usize,
    pub num_sacts: usize,
    pub num_hois: usize,
    pub acts: LevelStats,
    pub sacts: LevelStats,
    /// Instance counts per class, indexed by global class ID, for the
    /// six entity and predicate kinds.
    pub instances: HashMap<Kind, Vec<usize>>,
}

impl Stats {
    pub fn collect(dex: &Annodex) -> Result<Self> {
        let taxonomy = dex.taxonomy();

        let mut acts = LevelStats::new(taxonomy.num_classes(Kind::Activity));
        let act_ids = dex.query_acts().execute()?;
        for act in dex.get_acts(&act_ids)? {
            acts.record(act.cid, act.end - act.start);
        }

        let mut sacts = LevelStats::new(taxonomy.num_classes(Kind::SubActivity));
        let sact_ids = dex.query_sacts().execute()?;
        for sact in dex.get_sacts(&sact_ids)? {
            sacts.record(sact.cid, sact.end - sact.start);
        }

        let mut instances: HashMap<Kind, Vec<usize>> = [
            Kind::Actor,
            Kind::Object,
            Kind::IntransitiveAction,
            Kind::TransitiveAction,
            Kind::Attribute,
            Kind::Relationship,
        ]
        .into_iter()
        .map(|kind| (kind, vec![0; taxonomy.num_classes(kind)]))
        .collect();

        let hoi_ids = dex.query_hois().execute()?;
        for hoi in dex.get_hois(&hoi_ids)? {
            for entity in hoi.actors.iter() {
                instances.get_mut(&Kind::Actor).unwrap()[entity.cid] += 1;
            }
            for entity in hoi.objects.iter() {
                instances.get_mut(&Kind::Object).unwrap()[entity.cid] += 1;
            }
            for p in hoi.ias.iter() {
                instances.get_mut(&Kind::IntransitiveAction).unwrap()[p.cid] += 1;
            }
            for p in hoi.tas.iter() {
                instances.get_mut(&Kind::TransitiveAction).unwrap()[p.cid] += 1;
            }
            for p in hoi.atts.iter() {
                instances.get_mut(&Kind::Attribute).unwrap()[p.cid] += 1;
            }
            for p in hoi.rels.iter() {
                instances.get_mut(&Kind::Relationship).unwrap()[p.cid] += 1;
            }
        }

        debug!(
            acts = act_ids.len(),
            sacts = sact_ids.len(),
            hois = hoi_ids.len(),
            "statistics collected"
        );

        Ok(Self {
            num_acts: act_ids.len(),
            num_sacts: sact_ids.len(),
            num_hois: hoi_ids.len(),
            acts,
            sacts,
            instances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annodex_index::fixtures;

    #[test]
    fn test_collect_over_fixture() {
        let root = fixtures::write_dataset();
        let dex = Annodex::open(root.path()).unwrap();
        let stats = Stats::collect(&dex).unwrap();

        assert_eq!(stats.num_acts, 2);
        assert_eq!(stats.num_sacts, 3);
        assert_eq!(stats.num_hois, 4);

        // Activity vocab sorted: chores (0), meal_prep (1).
        assert_eq!(stats.acts.counts, vec![1, 1]);
        assert_eq!(stats.acts.durations, vec![80.0, 100.0]);

        // Sub-activity vocab sorted: cleaning (0), cooking (1), plating (2).
        assert_eq!(stats.sacts.counts, vec![2, 1, 0]);
        assert_eq!(stats.sacts.durations, vec![75.0, 40.0, 0.0]);

        // Actors sorted: assistant (0), chef (1).
        assert_eq!(stats.instances[&Kind::Actor], vec![3, 1]);
        // Objects sorted: knife (0), pan (1).
        assert_eq!(stats.instances[&Kind::Object], vec![1, 1]);
        // Intransitive actions sorted: stand (0), walk (1).
        assert_eq!(stats.instances[&Kind::IntransitiveAction], vec![1, 2]);
        // Transitive actions sorted: cut (0), hold (1).
        assert_eq!(stats.instances[&Kind::TransitiveAction], vec![0, 1]);
        // Attributes sorted: dirty (0), open (1).
        assert_eq!(stats.instances[&Kind::Attribute], vec![2, 0]);
        // Relationships sorted: behind (0), near (1).
        assert_eq!(stats.instances[&Kind::Relationship], vec![1, 0]);
    }
}
