//! Candidate records and result types

use serde::{Deserialize, Serialize};

/// Opaque member identifier
pub type MemberId = i64;

/// Ids coming out of a store are only trusted when positive
pub fn is_valid_member_id(id: MemberId) -> bool {
    id > 0
}

/// How a candidate relates to the requester in the friendship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// No graph relation: interaction-score or recent-signup candidate
    Unrelated,
    /// Friend of a friend
    Second,
    /// Friend of a second-degree candidate
    Third,
}

impl Depth {
    /// Numeric depth as exposed to clients (0, 2 or 3)
    pub fn as_u8(self) -> u8 {
        match self {
            Depth::Unrelated => 0,
            Depth::Second => 2,
            Depth::Third => 3,
        }
    }
}

/// One traversal hit and the bridges that led to it
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateInfo {
    /// Member being suggested
    pub candidate_id: MemberId,

    /// Bridges in discovery order, without duplicates
    connection_ids: Vec<MemberId>,

    /// Pairwise affinity with the requester
    pub interaction_score: f64,
}

impl CandidateInfo {
    pub fn new(candidate_id: MemberId) -> Self {
        Self {
            candidate_id,
            connection_ids: Vec::new(),
            interaction_score: 0.0,
        }
    }

    /// Record a bridge; returns false for duplicates and self-bridges
    pub fn add_connection(&mut self, bridge_id: MemberId) -> bool {
        if bridge_id == self.candidate_id || self.connection_ids.contains(&bridge_id) {
            return false;
        }
        self.connection_ids.push(bridge_id);
        true
    }

    pub fn connection_ids(&self) -> &[MemberId] {
        &self.connection_ids
    }

    pub fn connection_count(&self) -> usize {
        self.connection_ids.len()
    }
}

/// The scorable unit handed to ranking and backfill
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendCandidate {
    pub member_id: MemberId,
    pub depth: Depth,
    pub(crate) common_friends: Vec<MemberId>,
    pub(crate) virtual_score: f64,
    pub interaction_score: f64,
    pub(crate) acquaintance_id: Option<MemberId>,
    pub(crate) many_acquaintance: bool,
}

impl RecommendCandidate {
    pub fn new(member_id: MemberId, depth: Depth) -> Self {
        Self {
            member_id,
            depth,
            common_friends: Vec::new(),
            virtual_score: 0.0,
            interaction_score: 0.0,
            acquaintance_id: None,
            many_acquaintance: false,
        }
    }

    /// A candidate with no graph relation
    pub fn unrelated(member_id: MemberId, interaction_score: f64) -> Self {
        Self {
            interaction_score,
            ..Self::new(member_id, Depth::Unrelated)
        }
    }

    pub fn common_friends(&self) -> &[MemberId] {
        &self.common_friends
    }

    pub fn virtual_score(&self) -> f64 {
        self.virtual_score
    }

    /// Bridge shown as "how you might know them"
    pub fn acquaintance_id(&self) -> Option<MemberId> {
        self.acquaintance_id
    }

    /// True once two or more bridges are known
    pub fn many_acquaintance(&self) -> bool {
        self.many_acquaintance
    }
}

/// Display-ready recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedFriend {
    pub member_id: MemberId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquaintance_id: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquaintance_name: Option<String>,
    pub many_acquaintance: bool,
    pub depth: u8,
}

/// One page of an already ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
    /// Size of the whole ranked list
    pub total: usize,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Cut page `page` out of `all`; pages past the end are empty
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let total = all.len();
        let start = page.saturating_mul(page_size).min(total);
        let end = start.saturating_add(page_size).min(total);

        let items: Vec<T> = all.into_iter().skip(start).take(end - start).collect();

        Self {
            items,
            page,
            page_size,
            total,
            has_next: end < total,
        }
    }

    pub fn empty(page: usize, page_size: usize) -> Self {
        Self::slice(Vec::new(), page, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connections_keep_discovery_order() {
        let mut info = CandidateInfo::new(10);
        assert!(info.add_connection(3));
        assert!(info.add_connection(1));
        assert!(!info.add_connection(3));
        assert!(!info.add_connection(10));

        assert_eq!(info.connection_ids(), &[3, 1]);
        assert_eq!(info.connection_count(), 2);
    }

    #[test]
    fn test_depth_numbers() {
        assert_eq!(Depth::Unrelated.as_u8(), 0);
        assert_eq!(Depth::Second.as_u8(), 2);
        assert_eq!(Depth::Third.as_u8(), 3);
    }

    #[test]
    fn test_page_slice() {
        let page = Page::slice((1..=10).collect::<Vec<i32>>(), 1, 4);
        assert_eq!(page.items, vec![5, 6, 7, 8]);
        assert_eq!(page.total, 10);
        assert!(page.has_next);

        let last = Page::slice((1..=10).collect::<Vec<i32>>(), 2, 4);
        assert_eq!(last.items, vec![9, 10]);
        assert!(!last.has_next);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = Page::slice((1..=10).collect::<Vec<i32>>(), 5, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 10);
        assert!(!page.has_next);

        let huge = Page::slice(vec![1, 2, 3], usize::MAX, usize::MAX);
        assert!(huge.items.is_empty());
    }

    #[test]
    fn test_recommended_friend_serialization_skips_missing_acquaintance() {
        let friend = RecommendedFriend {
            member_id: 4,
            name: "Dana".to_string(),
            profile_image_url: None,
            acquaintance_id: None,
            acquaintance_name: None,
            many_acquaintance: false,
            depth: 0,
        };
        let json = serde_json::to_value(&friend).unwrap();
        assert!(json.get("acquaintance_id").is_none());
        assert_eq!(json["depth"], 0);
    }
}
