//! In-memory stores for tests and local development
//!
//! Each store counts its round trips and can be switched into an
//! unavailable state to exercise error propagation.

use crate::model::MemberId;
use crate::store::{FriendGraphStore, InteractionScoreStore, MemberDirectory, MemberDisplay};
use async_trait::async_trait;
use friendrec_common::errors::{AppError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Availability {
    down: AtomicBool,
    calls: AtomicUsize,
}

impl Availability {
    fn call(&self, store: &'static str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable(store, "simulated outage"));
        }
        Ok(())
    }
}

/// Undirected friendship graph
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    friends: HashMap<MemberId, HashSet<MemberId>>,
    availability: Availability,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mutual friendship
    pub fn with_friendship(mut self, a: MemberId, b: MemberId) -> Self {
        self.friends.entry(a).or_default().insert(b);
        self.friends.entry(b).or_default().insert(a);
        self
    }

    /// Add a one-sided adjacency entry, as a stale store might hold
    pub fn with_directed(mut self, from: MemberId, to: MemberId) -> Self {
        self.friends.entry(from).or_default().insert(to);
        self
    }

    pub fn set_unavailable(&self, down: bool) {
        self.availability.down.store(down, Ordering::SeqCst);
    }

    /// Round trips served so far
    pub fn calls(&self) -> usize {
        self.availability.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FriendGraphStore for MemoryGraphStore {
    async fn get_friends(&self, member_id: MemberId, limit: usize) -> Result<HashSet<MemberId>> {
        self.availability.call("friend graph")?;

        let mut friends: Vec<MemberId> = self
            .friends
            .get(&member_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        friends.sort_unstable();
        friends.truncate(limit);

        Ok(friends.into_iter().collect())
    }

    async fn get_friends_batch(
        &self,
        member_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, HashSet<MemberId>>> {
        self.availability.call("friend graph")?;

        Ok(member_ids
            .iter()
            .map(|id| (*id, self.friends.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}

/// Interaction scores kept in insertion order per member
#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    scores: HashMap<MemberId, Vec<(MemberId, f64)>>,
    availability: Availability,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score `member_id` has toward `other_id`
    pub fn with_score(mut self, member_id: MemberId, other_id: MemberId, score: f64) -> Self {
        let entries = self.scores.entry(member_id).or_default();
        match entries.iter_mut().find(|(id, _)| *id == other_id) {
            Some(entry) => entry.1 = score,
            None => entries.push((other_id, score)),
        }
        self
    }

    pub fn set_unavailable(&self, down: bool) {
        self.availability.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.availability.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionScoreStore for MemoryInteractionStore {
    async fn get_score(&self, member_id: MemberId, other_id: MemberId) -> Result<f64> {
        self.availability.call("interaction score")?;

        Ok(self
            .scores
            .get(&member_id)
            .and_then(|entries| entries.iter().find(|(id, _)| *id == other_id))
            .map(|(_, score)| *score)
            .unwrap_or(0.0))
    }

    async fn get_scores_batch(
        &self,
        member_id: MemberId,
        candidate_ids: &HashSet<MemberId>,
    ) -> Result<HashMap<MemberId, f64>> {
        self.availability.call("interaction score")?;

        Ok(self
            .scores
            .get(&member_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(id, _)| candidate_ids.contains(id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_all_scores(&self, member_id: MemberId) -> Result<Vec<(MemberId, f64)>> {
        self.availability.call("interaction score")?;

        Ok(self.scores.get(&member_id).cloned().unwrap_or_default())
    }
}

/// Members in signup order plus block entries
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    members: Vec<MemberDisplay>,
    blocks: Vec<(MemberId, MemberId)>,
    availability: Availability,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member; later registrations count as newer signups
    pub fn with_member(mut self, id: MemberId, name: &str) -> Self {
        self.members.push(MemberDisplay {
            id,
            name: name.to_string(),
            profile_image_url: None,
        });
        self
    }

    /// Register members named `member-{id}`
    pub fn with_members(self, ids: impl IntoIterator<Item = MemberId>) -> Self {
        ids.into_iter()
            .fold(self, |dir, id| dir.with_member(id, &format!("member-{}", id)))
    }

    pub fn with_block(mut self, blocker_id: MemberId, blocked_id: MemberId) -> Self {
        self.blocks.push((blocker_id, blocked_id));
        self
    }

    pub fn set_unavailable(&self, down: bool) {
        self.availability.down.store(down, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.availability.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemberDirectory for MemoryDirectory {
    async fn find_blacklist_ids(&self, member_id: MemberId) -> Result<HashSet<MemberId>> {
        self.availability.call("member directory")?;

        Ok(self
            .blocks
            .iter()
            .filter_map(|&(blocker, blocked)| {
                if blocker == member_id {
                    Some(blocked)
                } else if blocked == member_id {
                    Some(blocker)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn find_recent_member_ids(
        &self,
        exclude_ids: &HashSet<MemberId>,
        limit: usize,
    ) -> Result<Vec<MemberId>> {
        self.availability.call("member directory")?;

        Ok(self
            .members
            .iter()
            .rev()
            .map(|member| member.id)
            .filter(|id| !exclude_ids.contains(id))
            .take(limit)
            .collect())
    }

    async fn find_display_info(&self, member_ids: &[MemberId]) -> Result<Vec<MemberDisplay>> {
        self.availability.call("member directory")?;

        let wanted: HashSet<MemberId> = member_ids.iter().copied().collect();
        Ok(self
            .members
            .iter()
            .filter(|member| wanted.contains(&member.id))
            .cloned()
            .collect())
    }
}
