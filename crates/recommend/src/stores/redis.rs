//! Redis-backed friend graph and interaction stores
//!
//! Friend sets live at `{prefix}:friends:{id}` and interaction scores at
//! `{prefix}:interaction:{id}`, a sorted set keyed by counterpart id.

use crate::model::{is_valid_member_id, MemberId};
use crate::store::{FriendGraphStore, InteractionScoreStore};
use async_trait::async_trait;
use friendrec_common::cache::{keys, Cache};
use friendrec_common::errors::{AppError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

const GRAPH_STORE: &str = "friend graph";
const INTERACTION_STORE: &str = "interaction score";

fn unavailable(store: &'static str) -> impl FnOnce(AppError) -> AppError {
    move |e| AppError::store_unavailable(store, e.to_string())
}

/// Parse set members, skipping anything that is not a valid id
fn parse_ids(owner: MemberId, raw: Vec<String>) -> HashSet<MemberId> {
    raw.into_iter()
        .filter_map(|value| match value.parse::<MemberId>() {
            Ok(id) if is_valid_member_id(id) => Some(id),
            _ => {
                warn!(owner, value = %value, "Skipping malformed member id");
                None
            }
        })
        .collect()
}

/// Friend graph kept as one Redis set per member
#[derive(Clone)]
pub struct RedisGraphStore {
    cache: Arc<Cache>,
}

impl RedisGraphStore {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl FriendGraphStore for RedisGraphStore {
    async fn get_friends(&self, member_id: MemberId, limit: usize) -> Result<HashSet<MemberId>> {
        if limit == 0 {
            return Ok(HashSet::new());
        }

        let raw = self
            .cache
            .set_members_sample(&keys::friends(member_id), limit)
            .await
            .map_err(unavailable(GRAPH_STORE))?;

        Ok(parse_ids(member_id, raw))
    }

    async fn get_friends_batch(
        &self,
        member_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, HashSet<MemberId>>> {
        let ids: Vec<MemberId> = member_ids.iter().copied().collect();
        let set_keys: Vec<String> = ids.iter().map(|&id| keys::friends(id)).collect();

        let sets = self
            .cache
            .set_members_batch(&set_keys)
            .await
            .map_err(unavailable(GRAPH_STORE))?;

        Ok(ids
            .into_iter()
            .zip(sets)
            .map(|(id, raw)| (id, parse_ids(id, raw)))
            .collect())
    }
}

/// Interaction scores kept as one Redis sorted set per member
#[derive(Clone)]
pub struct RedisInteractionStore {
    cache: Arc<Cache>,
}

impl RedisInteractionStore {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl InteractionScoreStore for RedisInteractionStore {
    async fn get_score(&self, member_id: MemberId, other_id: MemberId) -> Result<f64> {
        let score = self
            .cache
            .sorted_score(&keys::interaction(member_id), &other_id.to_string())
            .await
            .map_err(unavailable(INTERACTION_STORE))?;

        Ok(score.unwrap_or(0.0))
    }

    async fn get_scores_batch(
        &self,
        member_id: MemberId,
        candidate_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, f64>> {
        let ids: Vec<MemberId> = candidate_ids.iter().copied().collect();
        let members: Vec<String> = ids.iter().map(ToString::to_string).collect();

        let scores = self
            .cache
            .sorted_scores(&keys::interaction(member_id), &members)
            .await
            .map_err(unavailable(INTERACTION_STORE))?;

        Ok(ids
            .into_iter()
            .zip(scores)
            .filter_map(|(id, score)| score.map(|s| (id, s)))
            .collect())
    }

    async fn get_all_scores(&self, member_id: MemberId) -> Result<Vec<(MemberId, f64)>> {
        let entries = self
            .cache
            .sorted_desc(&keys::interaction(member_id))
            .await
            .map_err(unavailable(INTERACTION_STORE))?;

        Ok(entries
            .into_iter()
            .filter_map(|(value, score)| match value.parse::<MemberId>() {
                Ok(id) if is_valid_member_id(id) => Some((id, score)),
                _ => {
                    warn!(member_id, value = %value, "Skipping malformed interaction entry");
                    None
                }
            })
            .collect())
    }
}
