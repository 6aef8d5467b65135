//! Bounded friend-of-friend traversal
//!
//! Walks at most two hops out from the requester's friends, one batched
//! store call per hop. The third-degree hop only runs when the second
//! degree alone cannot fill a recommendation list.

use crate::model::{is_valid_member_id, MemberId};
use crate::relation::{FriendRelation, RelationBuilder};
use crate::store::FriendGraphStore;
use friendrec_common::config::RecommendConfig;
use friendrec_common::errors::Result;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Build the relation of `member_id` from its first-degree friends.
///
/// Returns `None` when there are no friends to start from.
pub async fn traverse<G>(
    graph: &G,
    member_id: MemberId,
    first_degree: &HashSet<MemberId>,
    config: &RecommendConfig,
) -> Result<Option<FriendRelation>>
where
    G: FriendGraphStore + ?Sized,
{
    if first_degree.is_empty() {
        return Ok(None);
    }

    let mut builder = RelationBuilder::new(member_id, first_degree.clone());

    let bridges = graph.get_friends_batch(first_degree).await?;
    for (bridge_id, targets) in sorted(bridges) {
        if !first_degree.contains(&bridge_id) {
            debug!(bridge_id, "Skipping unrequested bridge");
            continue;
        }
        for target_id in targets {
            if !is_valid_member_id(target_id) {
                debug!(bridge_id, target_id, "Skipping malformed member id");
                continue;
            }
            builder.add_second_degree(bridge_id, target_id);
        }
    }

    let second_len = builder.second_degree_len();
    debug!(member_id, first = first_degree.len(), second = second_len, "Second degree collected");

    if second_len > 0 && second_len < config.recommend_limit {
        let second_ids = builder.second_degree_ids();
        let hop = graph.get_friends_batch(&second_ids).await?;

        let mut third = 0usize;
        for (bridge_id, targets) in sorted(hop) {
            if !second_ids.contains(&bridge_id) {
                debug!(bridge_id, "Skipping unrequested bridge");
                continue;
            }
            for target_id in targets {
                if !is_valid_member_id(target_id) {
                    debug!(bridge_id, target_id, "Skipping malformed member id");
                    continue;
                }
                if builder.add_third_degree(bridge_id, target_id) {
                    third += 1;
                }
            }
        }
        debug!(member_id, links = third, "Third degree collected");
    }

    Ok(Some(builder.build()))
}

/// Bridges and their targets in ascending id order
fn sorted(batch: HashMap<MemberId, HashSet<MemberId>>) -> Vec<(MemberId, Vec<MemberId>)> {
    let mut entries: Vec<(MemberId, Vec<MemberId>)> = batch
        .into_iter()
        .map(|(bridge_id, targets)| {
            let mut targets: Vec<MemberId> = targets.into_iter().collect();
            targets.sort_unstable();
            (bridge_id, targets)
        })
        .collect();
    entries.sort_unstable_by_key(|(bridge_id, _)| *bridge_id);
    entries
}
