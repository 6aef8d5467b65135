//! Traversal result aggregate
//!
//! A [`RelationBuilder`] accumulates candidates while the graph is walked and
//! is frozen into a [`FriendRelation`]. Candidates are kept in insertion
//! order and indexed by id.

use crate::model::{CandidateInfo, Depth, MemberId, RecommendCandidate};
use std::collections::{HashMap, HashSet};

/// Insertion-ordered candidate records with an id index
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<CandidateInfo>,
    index: HashMap<MemberId, usize>,
}

impl CandidateSet {
    fn entry(&mut self, candidate_id: MemberId) -> &mut CandidateInfo {
        let slot = match self.index.get(&candidate_id) {
            Some(&slot) => slot,
            None => {
                self.entries.push(CandidateInfo::new(candidate_id));
                self.index.insert(candidate_id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot]
    }

    pub fn get(&self, candidate_id: MemberId) -> Option<&CandidateInfo> {
        self.index.get(&candidate_id).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, candidate_id: MemberId) -> bool {
        self.index.contains_key(&candidate_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateInfo> {
        self.entries.iter()
    }

    pub fn ids(&self) -> HashSet<MemberId> {
        self.index.keys().copied().collect()
    }
}

/// Mutable accumulator for one traversal run
#[derive(Debug)]
pub struct RelationBuilder {
    member_id: MemberId,
    first_degree_ids: HashSet<MemberId>,
    second_degree: CandidateSet,
    third_degree: CandidateSet,
}

impl RelationBuilder {
    pub fn new(member_id: MemberId, first_degree_ids: HashSet<MemberId>) -> Self {
        Self {
            member_id,
            first_degree_ids,
            second_degree: CandidateSet::default(),
            third_degree: CandidateSet::default(),
        }
    }

    /// Record that first-degree `bridge_id` is friends with `target_id`.
    ///
    /// Returns false when the target is the requester or already a friend.
    pub fn add_second_degree(&mut self, bridge_id: MemberId, target_id: MemberId) -> bool {
        if target_id == self.member_id || self.first_degree_ids.contains(&target_id) {
            return false;
        }
        self.second_degree.entry(target_id).add_connection(bridge_id);
        true
    }

    /// Record that second-degree `bridge_id` is friends with `target_id`.
    ///
    /// Returns false when the target is the requester, a friend, or already
    /// a second-degree candidate.
    pub fn add_third_degree(&mut self, bridge_id: MemberId, target_id: MemberId) -> bool {
        if target_id == self.member_id
            || self.first_degree_ids.contains(&target_id)
            || self.second_degree.contains(target_id)
        {
            return false;
        }
        self.third_degree.entry(target_id).add_connection(bridge_id);
        true
    }

    pub fn second_degree_len(&self) -> usize {
        self.second_degree.len()
    }

    pub fn second_degree_ids(&self) -> HashSet<MemberId> {
        self.second_degree.ids()
    }

    pub fn build(self) -> FriendRelation {
        FriendRelation {
            member_id: self.member_id,
            first_degree_ids: self.first_degree_ids,
            second_degree: self.second_degree,
            third_degree: self.third_degree,
        }
    }
}

/// Frozen result of one traversal run; never shared across requests
#[derive(Debug, Clone)]
pub struct FriendRelation {
    member_id: MemberId,
    first_degree_ids: HashSet<MemberId>,
    second_degree: CandidateSet,
    third_degree: CandidateSet,
}

impl FriendRelation {
    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn first_degree_ids(&self) -> &HashSet<MemberId> {
        &self.first_degree_ids
    }

    pub fn second_degree(&self) -> &CandidateSet {
        &self.second_degree
    }

    pub fn third_degree(&self) -> &CandidateSet {
        &self.third_degree
    }

    pub fn has_second_degree(&self) -> bool {
        !self.second_degree.is_empty()
    }

    /// Every candidate id at depth 2 or 3
    pub fn candidate_ids(&self) -> HashSet<MemberId> {
        self.second_degree
            .iter()
            .chain(self.third_degree.iter())
            .map(|info| info.candidate_id)
            .collect()
    }

    /// Copy of this relation with interaction scores applied
    pub fn with_interaction_scores(mut self, scores: &HashMap<MemberId, f64>) -> Self {
        for info in self
            .second_degree
            .entries
            .iter_mut()
            .chain(self.third_degree.entries.iter_mut())
        {
            if let Some(&score) = scores.get(&info.candidate_id) {
                info.interaction_score = score;
            }
        }
        self
    }

    /// Flatten into scored candidates, second degree first
    pub fn to_candidates(&self) -> Vec<RecommendCandidate> {
        let mut candidates = Vec::with_capacity(self.second_degree.len() + self.third_degree.len());

        for info in self.second_degree.iter() {
            let mut candidate = RecommendCandidate::new(info.candidate_id, Depth::Second);
            for &bridge_id in info.connection_ids() {
                candidate.add_common_friend(bridge_id);
            }
            candidate.interaction_score = info.interaction_score;
            candidates.push(candidate);
        }

        for info in self.third_degree.iter() {
            let mut candidate = RecommendCandidate::new(info.candidate_id, Depth::Third);
            // Credit is the bridge's own common-friend count, not a count
            // of this candidate's common friends.
            for &bridge_id in info.connection_ids() {
                let bridge_common = self
                    .second_degree
                    .get(bridge_id)
                    .map(CandidateInfo::connection_count)
                    .unwrap_or(0);
                candidate.add_virtual_score(bridge_common);
            }
            candidate.interaction_score = info.interaction_score;
            candidates.push(candidate);
        }

        candidates
    }
}
