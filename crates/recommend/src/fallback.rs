//! Interaction-only candidates for members without usable graph data

use crate::model::{is_valid_member_id, MemberId, RecommendCandidate};
use std::collections::HashSet;
use tracing::debug;

/// One unrelated candidate per scored counterpart, in store order
pub fn interaction_candidates(
    member_id: MemberId,
    scores: &[(MemberId, f64)],
) -> Vec<RecommendCandidate> {
    let mut seen = HashSet::with_capacity(scores.len());

    let candidates: Vec<RecommendCandidate> = scores
        .iter()
        .filter(|(other_id, _)| *other_id != member_id && is_valid_member_id(*other_id))
        .filter(|(other_id, _)| seen.insert(*other_id))
        .map(|&(other_id, score)| RecommendCandidate::unrelated(other_id, score))
        .collect();

    debug!(member_id, candidates = candidates.len(), "Interaction fallback");
    candidates
}
