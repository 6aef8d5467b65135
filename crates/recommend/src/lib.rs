//! FriendRec recommendation engine
//!
//! Suggests new connections to a member by walking their friendship graph:
//! - Friends of friends (second degree) and, when those are scarce,
//!   friends of those (third degree)
//! - Scoring by depth, common friends and interaction affinity
//! - Interaction-only fallback for members without graph data
//! - Exclusion of self, friends and blocked members, then backfill from
//!   interaction scores and recent signups
//!
//! Stores are reached through the traits in [`store`]; [`stores`] holds the
//! Redis, database and in-memory implementations.

pub mod assembler;
pub mod backfill;
pub mod fallback;
pub mod model;
pub mod relation;
pub mod scoring;
pub mod service;
pub mod store;
pub mod stores;
pub mod traversal;

pub use model::{Depth, MemberId, Page, RecommendCandidate, RecommendedFriend};
pub use relation::{FriendRelation, RelationBuilder};
pub use service::RecommendationService;
pub use store::{FriendGraphStore, InteractionScoreStore, MemberDirectory, MemberDisplay};
