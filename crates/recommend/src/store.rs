//! Store interfaces consumed by the engine
//!
//! Every method is one round trip; the engine never calls a store per
//! candidate.

use crate::model::MemberId;
use async_trait::async_trait;
use friendrec_common::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Friendship adjacency
#[async_trait]
pub trait FriendGraphStore: Send + Sync {
    /// Up to `limit` direct friends of `member_id`
    async fn get_friends(&self, member_id: MemberId, limit: usize) -> Result<HashSet<MemberId>>;

    /// Direct friends of every member in `member_ids`
    async fn get_friends_batch(
        &self,
        member_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, HashSet<MemberId>>>;
}

/// Pairwise behavioral affinity
#[async_trait]
pub trait InteractionScoreStore: Send + Sync {
    /// Affinity between two members, 0 when unknown
    async fn get_score(&self, member_id: MemberId, other_id: MemberId) -> Result<f64>;

    /// Affinity with each of `candidate_ids`; unknown pairs are omitted
    async fn get_scores_batch(
        &self,
        member_id: MemberId,
        candidate_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, f64>>;

    /// Every known counterpart in the store's natural order
    async fn get_all_scores(&self, member_id: MemberId) -> Result<Vec<(MemberId, f64)>>;
}

/// Name and avatar of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDisplay {
    pub id: MemberId,
    pub name: String,
    pub profile_image_url: Option<String>,
}

/// Member lookups outside the graph
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Members who blocked, or were blocked by, `member_id`
    async fn find_blacklist_ids(&self, member_id: MemberId) -> Result<HashSet<MemberId>>;

    /// Newest members first, skipping `exclude_ids`
    async fn find_recent_member_ids(
        &self,
        exclude_ids: &HashSet<MemberId>,
        limit: usize,
    ) -> Result<Vec<MemberId>>;

    /// Display records for the ids that exist, in any order
    async fn find_display_info(&self, member_ids: &[MemberId]) -> Result<Vec<MemberDisplay>>;
}
