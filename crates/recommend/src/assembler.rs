//! Display enrichment of the ranked list

use crate::model::{Depth, MemberId, RecommendCandidate, RecommendedFriend};
use crate::store::{MemberDirectory, MemberDisplay};
use friendrec_common::errors::Result;
use friendrec_common::metrics;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Turn ranked candidates into display records, keeping their order.
///
/// Candidates the directory does not know are dropped.
pub async fn assemble<D>(
    directory: &D,
    candidates: &[RecommendCandidate],
) -> Result<Vec<RecommendedFriend>>
where
    D: MemberDirectory + ?Sized,
{
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<MemberId> = candidates.iter().map(|c| c.member_id).collect();
    let members = by_id(directory.find_display_info(&ids).await?);

    let mut seen = HashSet::new();
    let acquaintance_ids: Vec<MemberId> = candidates
        .iter()
        .filter(|c| c.depth == Depth::Second)
        .filter_map(RecommendCandidate::acquaintance_id)
        .filter(|id| seen.insert(*id))
        .collect();

    let acquaintances = if acquaintance_ids.is_empty() {
        HashMap::new()
    } else {
        by_id(directory.find_display_info(&acquaintance_ids).await?)
    };

    let mut friends = Vec::with_capacity(candidates.len());
    let mut dropped = 0usize;

    for candidate in candidates {
        let Some(member) = members.get(&candidate.member_id) else {
            warn!(member_id = candidate.member_id, "No display info, dropping candidate");
            dropped += 1;
            continue;
        };

        let acquaintance_id = match candidate.depth {
            Depth::Second => candidate.acquaintance_id(),
            _ => None,
        };
        let acquaintance_name = acquaintance_id
            .and_then(|id| acquaintances.get(&id))
            .map(|a| a.name.clone());

        friends.push(RecommendedFriend {
            member_id: member.id,
            name: member.name.clone(),
            profile_image_url: member.profile_image_url.clone(),
            acquaintance_id,
            acquaintance_name,
            many_acquaintance: candidate.many_acquaintance(),
            depth: candidate.depth.as_u8(),
        });
    }

    if dropped > 0 {
        metrics::record_dropped("missing_display", dropped);
    }

    Ok(friends)
}

fn by_id(records: Vec<MemberDisplay>) -> HashMap<MemberId, MemberDisplay> {
    records.into_iter().map(|m| (m.id, m)).collect()
}
