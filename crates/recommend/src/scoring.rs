//! Candidate scoring
//!
//! Depth dominates the score: the weakest second-degree candidate (50)
//! outranks the strongest third-degree one (20 + 5 + 10). Common-friend
//! credit saturates at 10 friends and interaction credit at 10 points.

use crate::model::{Depth, MemberId, RecommendCandidate};

/// Base score of a friend-of-a-friend
pub const SECOND_DEGREE_BASE: f64 = 50.0;

/// Base score of a third-degree candidate
pub const THIRD_DEGREE_BASE: f64 = 20.0;

/// Common friends counted toward a second-degree score
pub const COMMON_FRIEND_CAP: usize = 10;

/// Points per counted common friend
pub const COMMON_FRIEND_WEIGHT: f64 = 2.0;

/// Virtual credit inherited per common friend of a bridge
pub const VIRTUAL_SCORE_WEIGHT: f64 = 0.5;

/// Ceiling of the third-degree virtual credit
pub const VIRTUAL_SCORE_CAP: f64 = 5.0;

/// Ceiling of the interaction contribution
pub const INTERACTION_CAP: f64 = 10.0;

impl RecommendCandidate {
    /// Record a bridge friend; the first one becomes the displayed acquaintance
    pub fn add_common_friend(&mut self, bridge_id: MemberId) {
        if self.common_friends.contains(&bridge_id) {
            return;
        }
        self.common_friends.push(bridge_id);

        if self.acquaintance_id.is_none() {
            self.acquaintance_id = Some(bridge_id);
        }
        if self.common_friends.len() >= 2 {
            self.many_acquaintance = true;
        }
    }

    /// Inherit credit from a bridge with `bridge_common_count` common friends
    pub fn add_virtual_score(&mut self, bridge_common_count: usize) {
        self.virtual_score += bridge_common_count as f64 * VIRTUAL_SCORE_WEIGHT;
    }

    /// Graph-derived part of the score
    pub fn common_score(&self) -> f64 {
        match self.depth {
            Depth::Second => {
                self.common_friends.len().min(COMMON_FRIEND_CAP) as f64 * COMMON_FRIEND_WEIGHT
            }
            Depth::Third => self.virtual_score.min(VIRTUAL_SCORE_CAP),
            Depth::Unrelated => 0.0,
        }
    }

    /// Comparable score used for ranking
    pub fn total_score(&self) -> f64 {
        base_score(self.depth) + self.common_score() + capped_interaction(self.interaction_score)
    }
}

pub fn base_score(depth: Depth) -> f64 {
    match depth {
        Depth::Second => SECOND_DEGREE_BASE,
        Depth::Third => THIRD_DEGREE_BASE,
        Depth::Unrelated => 0.0,
    }
}

pub fn capped_interaction(interaction_score: f64) -> f64 {
    interaction_score.min(INTERACTION_CAP)
}

/// Score of a candidate, without touching it
pub fn score(candidate: &RecommendCandidate) -> f64 {
    candidate.total_score()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn second_degree(common: &[MemberId], interaction: f64) -> RecommendCandidate {
        let mut candidate = RecommendCandidate::new(100, Depth::Second);
        for &bridge in common {
            candidate.add_common_friend(bridge);
        }
        candidate.interaction_score = interaction;
        candidate
    }

    #[test]
    fn test_acquaintance_is_first_bridge() {
        let mut candidate = RecommendCandidate::new(9, Depth::Second);
        candidate.add_common_friend(4);
        assert_eq!(candidate.acquaintance_id(), Some(4));
        assert!(!candidate.many_acquaintance());

        candidate.add_common_friend(2);
        assert_eq!(candidate.acquaintance_id(), Some(4));
        assert!(candidate.many_acquaintance());
    }

    #[test]
    fn test_duplicate_bridge_does_not_count_twice() {
        let mut candidate = RecommendCandidate::new(9, Depth::Second);
        candidate.add_common_friend(4);
        candidate.add_common_friend(4);
        assert_eq!(candidate.common_friends(), &[4]);
        assert!(!candidate.many_acquaintance());
        assert_eq!(candidate.total_score(), 52.0);
    }

    #[test]
    fn test_second_degree_score() {
        assert_eq!(second_degree(&[1, 2], 0.0).total_score(), 54.0);
        assert_eq!(second_degree(&[2], 0.0).total_score(), 52.0);
        assert_eq!(second_degree(&[2], 3.5).total_score(), 55.5);
    }

    #[test]
    fn test_common_friend_cap() {
        let hub: Vec<MemberId> = (1..=40).collect();
        let candidate = second_degree(&hub, 0.0);
        assert_eq!(candidate.common_score(), 20.0);
        assert_eq!(candidate.total_score(), 70.0);
    }

    #[test]
    fn test_interaction_cap() {
        assert_eq!(second_degree(&[], 250.0).total_score(), 60.0);
        assert_eq!(RecommendCandidate::unrelated(5, 99.0).total_score(), 10.0);
        assert_eq!(RecommendCandidate::unrelated(5, 4.0).total_score(), 4.0);
    }

    #[test]
    fn test_third_degree_virtual_score() {
        let mut candidate = RecommendCandidate::new(7, Depth::Third);
        candidate.add_virtual_score(3);
        assert_eq!(candidate.virtual_score(), 1.5);
        assert_eq!(candidate.total_score(), 21.5);

        candidate.add_virtual_score(30);
        assert_eq!(candidate.common_score(), 5.0);
    }

    #[test]
    fn test_depth_dominance() {
        let weakest_second = second_degree(&[], 0.0);

        let mut strongest_third = RecommendCandidate::new(8, Depth::Third);
        strongest_third.add_virtual_score(1_000);
        strongest_third.interaction_score = 1_000.0;

        assert_eq!(strongest_third.total_score(), 35.0);
        assert!(score(&weakest_second) >= score(&strongest_third));
    }

    #[test]
    fn test_unrelated_has_no_graph_credit() {
        let mut candidate = RecommendCandidate::unrelated(3, 0.0);
        candidate.add_virtual_score(10);
        assert_eq!(candidate.common_score(), 0.0);
        assert_eq!(base_score(Depth::Unrelated), 0.0);
    }
}
