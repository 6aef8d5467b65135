//! Ranking, exclusion and backfill
//!
//! After ranking, the list is cleaned of members who must never be
//! suggested and then padded up to the limit: first from the interaction
//! scores already in hand, then from the newest signups.

use crate::model::{is_valid_member_id, MemberId, RecommendCandidate};
use crate::store::MemberDirectory;
use friendrec_common::errors::Result;
use std::collections::HashSet;
use tracing::debug;

/// Sort by total score, highest first, and keep the top `limit`.
///
/// Ties keep their incoming order.
pub fn rank(mut candidates: Vec<RecommendCandidate>, limit: usize) -> Vec<RecommendCandidate> {
    candidates.sort_by(|a, b| b.total_score().total_cmp(&a.total_score()));
    candidates.truncate(limit);
    candidates
}

/// Drop the requester, friends and blacklisted members; returns how many went
pub fn remove_excluded(
    selected: &mut Vec<RecommendCandidate>,
    member_id: MemberId,
    first_degree: &HashSet<MemberId>,
    blacklist: &HashSet<MemberId>,
) -> usize {
    let before = selected.len();
    selected.retain(|c| {
        c.member_id != member_id
            && !first_degree.contains(&c.member_id)
            && !blacklist.contains(&c.member_id)
    });
    before - selected.len()
}

/// Ids that backfill must not add
pub fn exclusion_set(
    member_id: MemberId,
    first_degree: &HashSet<MemberId>,
    selected: &[RecommendCandidate],
    blacklist: &HashSet<MemberId>,
) -> HashSet<MemberId> {
    let mut exclusion: HashSet<MemberId> = first_degree.union(blacklist).copied().collect();
    exclusion.insert(member_id);
    exclusion.extend(selected.iter().map(|c| c.member_id));
    exclusion
}

/// Append interaction-only candidates in store order until `limit`
pub fn fill_from_interactions(
    selected: &mut Vec<RecommendCandidate>,
    scores: &[(MemberId, f64)],
    exclusion: &mut HashSet<MemberId>,
    limit: usize,
) -> usize {
    let before = selected.len();

    for &(other_id, score) in scores {
        if selected.len() >= limit {
            break;
        }
        if !is_valid_member_id(other_id) || !exclusion.insert(other_id) {
            continue;
        }
        selected.push(RecommendCandidate::unrelated(other_id, score));
    }

    selected.len() - before
}

/// Append the newest members outside `exclusion` until `limit`
pub async fn fill_from_recent<D>(
    selected: &mut Vec<RecommendCandidate>,
    directory: &D,
    exclusion: &mut HashSet<MemberId>,
    limit: usize,
) -> Result<usize>
where
    D: MemberDirectory + ?Sized,
{
    let missing = limit.saturating_sub(selected.len());
    if missing == 0 {
        return Ok(0);
    }

    let recent = directory.find_recent_member_ids(exclusion, missing).await?;
    let before = selected.len();

    for other_id in recent {
        if selected.len() >= limit {
            break;
        }
        if !is_valid_member_id(other_id) || !exclusion.insert(other_id) {
            debug!(other_id, "Skipping recent member");
            continue;
        }
        selected.push(RecommendCandidate::unrelated(other_id, 0.0));
    }

    Ok(selected.len() - before)
}
