//! Recommendation orchestration
//!
//! One request runs these steps in order:
//! 1. Fetch the requester's friends (bounded by the scan limit)
//! 2. Traverse to second and, when short, third degree
//! 3. Inject interaction scores, or fall back to interaction-only candidates
//! 4. Rank and cut to the recommendation limit
//! 5. Exclude self, friends and blocks, then backfill
//! 6. Enrich for display and paginate

use crate::assembler;
use crate::backfill;
use crate::fallback;
use crate::model::{is_valid_member_id, MemberId, Page, RecommendCandidate, RecommendedFriend};
use crate::store::{FriendGraphStore, InteractionScoreStore, MemberDirectory};
use crate::traversal;
use friendrec_common::config::RecommendConfig;
use friendrec_common::errors::{AppError, Result};
use friendrec_common::metrics;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Entry point of the engine; cheap to clone and shared across requests
#[derive(Clone)]
pub struct RecommendationService {
    graph: Arc<dyn FriendGraphStore>,
    interactions: Arc<dyn InteractionScoreStore>,
    directory: Arc<dyn MemberDirectory>,
    config: RecommendConfig,
}

impl RecommendationService {
    pub fn new(
        graph: Arc<dyn FriendGraphStore>,
        interactions: Arc<dyn InteractionScoreStore>,
        directory: Arc<dyn MemberDirectory>,
        config: RecommendConfig,
    ) -> Self {
        Self {
            graph,
            interactions,
            directory,
            config,
        }
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    /// Ranked, filtered and backfilled candidates for `member_id`
    #[instrument(skip(self))]
    pub async fn recommend(&self, member_id: MemberId) -> Result<Vec<RecommendCandidate>> {
        if !is_valid_member_id(member_id) {
            return Err(AppError::Validation {
                message: format!("Invalid member id: {}", member_id),
                field: Some("member_id".to_string()),
            });
        }

        let started = Instant::now();
        let limit = self.config.recommend_limit;

        let first_degree: HashSet<MemberId> = self
            .graph
            .get_friends(member_id, self.config.first_degree_scan_limit)
            .await?
            .into_iter()
            .filter(|&id| is_valid_member_id(id) && id != member_id)
            .collect();

        let relation = traversal::traverse(self.graph.as_ref(), member_id, &first_degree, &self.config)
            .await?
            .filter(|relation| relation.has_second_degree());

        // Fetched at most once per request, by the fallback or by backfill
        let mut all_scores: Option<Vec<(MemberId, f64)>> = None;

        let (candidates, source) = match relation {
            Some(relation) => {
                let ids = relation.candidate_ids();
                let scores = self.interactions.get_scores_batch(member_id, &ids).await?;
                (relation.with_interaction_scores(&scores).to_candidates(), "graph")
            }
            None => {
                let scores = self.interactions.get_all_scores(member_id).await?;
                let candidates = fallback::interaction_candidates(member_id, &scores);
                all_scores = Some(scores);
                (candidates, "interaction")
            }
        };
        debug!(member_id, source, candidates = candidates.len(), "Candidates collected");

        let mut selected = backfill::rank(candidates, limit);

        let blacklist = self.directory.find_blacklist_ids(member_id).await?;
        let removed = backfill::remove_excluded(&mut selected, member_id, &first_degree, &blacklist);
        if removed > 0 {
            metrics::record_dropped("excluded", removed);
        }

        if selected.len() < limit {
            let mut exclusion =
                backfill::exclusion_set(member_id, &first_degree, &selected, &blacklist);

            let scores = match all_scores {
                Some(scores) => scores,
                None => self.interactions.get_all_scores(member_id).await?,
            };
            let from_interactions =
                backfill::fill_from_interactions(&mut selected, &scores, &mut exclusion, limit);
            metrics::record_backfill("interaction", from_interactions);

            if selected.len() < limit {
                let from_recent = backfill::fill_from_recent(
                    &mut selected,
                    self.directory.as_ref(),
                    &mut exclusion,
                    limit,
                )
                .await?;
                metrics::record_backfill("recent", from_recent);
            }
        }

        metrics::record_recommendation(started.elapsed().as_secs_f64(), source);
        info!(
            member_id,
            source,
            results = selected.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Recommendations computed"
        );

        Ok(selected)
    }

    /// Display-ready page `page` (zero-based) of the recommendations
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        member_id: MemberId,
        page: usize,
        page_size: usize,
    ) -> Result<Page<RecommendedFriend>> {
        if page_size == 0 {
            return Err(AppError::Validation {
                message: "page_size must be at least 1".to_string(),
                field: Some("page_size".to_string()),
            });
        }

        let ranked = self.recommend(member_id).await?;
        let friends = assembler::assemble(self.directory.as_ref(), &ranked).await?;

        Ok(Page::slice(friends, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Depth;
    use crate::stores::{MemoryDirectory, MemoryGraphStore, MemoryInteractionStore};

    // Scenario members
    const R: MemberId = 1;
    const A: MemberId = 2;
    const B: MemberId = 3;
    const C: MemberId = 4;
    const D: MemberId = 5;

    struct Fixture {
        graph: Arc<MemoryGraphStore>,
        interactions: Arc<MemoryInteractionStore>,
        directory: Arc<MemoryDirectory>,
        service: RecommendationService,
    }

    fn fixture(
        graph: MemoryGraphStore,
        interactions: MemoryInteractionStore,
        directory: MemoryDirectory,
        limit: usize,
    ) -> Fixture {
        let graph = Arc::new(graph);
        let interactions = Arc::new(interactions);
        let directory = Arc::new(directory);
        let service = RecommendationService::new(
            graph.clone(),
            interactions.clone(),
            directory.clone(),
            RecommendConfig::with_limits(200, limit),
        );
        Fixture {
            graph,
            interactions,
            directory,
            service,
        }
    }

    fn scenario_graph() -> MemoryGraphStore {
        MemoryGraphStore::new()
            .with_friendship(R, A)
            .with_friendship(R, B)
            .with_friendship(A, C)
            .with_friendship(B, C)
            .with_friendship(B, D)
    }

    fn ids(candidates: &[RecommendCandidate]) -> Vec<MemberId> {
        candidates.iter().map(|c| c.member_id).collect()
    }

    #[tokio::test]
    async fn test_scenario_ranking_with_backfill() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new().with_members(1..=8),
            10,
        );

        let ranked = f.service.recommend(R).await.unwrap();

        assert_eq!(ids(&ranked), vec![C, D, 8, 7, 6]);

        let c = &ranked[0];
        assert_eq!(c.depth, Depth::Second);
        assert_eq!(c.common_friends(), &[A, B]);
        assert!(c.many_acquaintance());
        assert_eq!(c.total_score(), 54.0);

        let d = &ranked[1];
        assert_eq!(d.common_friends(), &[B]);
        assert_eq!(d.total_score(), 52.0);

        assert!(ranked[2..].iter().all(|c| c.depth == Depth::Unrelated));
    }

    #[tokio::test]
    async fn test_store_calls_are_batched() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new().with_members(1..=8),
            10,
        );

        f.service.get_recommendations(R, 0, 10).await.unwrap();

        // friends, second hop, third hop
        assert_eq!(f.graph.calls(), 3);
        // batch scores, backfill scores
        assert_eq!(f.interactions.calls(), 2);
        // blacklist, recent, display, acquaintance display
        assert_eq!(f.directory.calls(), 4);
    }

    #[tokio::test]
    async fn test_page_contents() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new()
                .with_member(A, "Ann")
                .with_member(B, "Ben")
                .with_member(C, "Cara")
                .with_member(D, "Dev"),
            10,
        );

        let page = f.service.get_recommendations(R, 0, 1).await.unwrap();

        assert_eq!(page.total, 2);
        assert!(page.has_next);
        let cara = &page.items[0];
        assert_eq!(cara.name, "Cara");
        assert_eq!(cara.acquaintance_id, Some(A));
        assert_eq!(cara.acquaintance_name.as_deref(), Some("Ann"));
        assert!(cara.many_acquaintance);
        assert_eq!(cara.depth, 2);

        let second = f.service.get_recommendations(R, 1, 1).await.unwrap();
        assert_eq!(second.items[0].name, "Dev");
        assert_eq!(second.items[0].acquaintance_name.as_deref(), Some("Ben"));
    }

    #[tokio::test]
    async fn test_page_past_limit_is_empty() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new().with_members(1..=8),
            10,
        );

        let page = f.service.get_recommendations(R, 3, 10).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new(),
            10,
        );

        let err = f.service.get_recommendations(R, 0, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(f.graph.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_member_id_is_rejected() {
        let f = fixture(
            MemoryGraphStore::new(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new(),
            10,
        );

        assert!(f.service.recommend(0).await.is_err());
        assert!(f.service.recommend(-3).await.is_err());
    }

    #[tokio::test]
    async fn test_never_recommends_self_or_friends() {
        // Scores toward self and friends must not leak in through backfill
        let f = fixture(
            scenario_graph().with_directed(C, R),
            MemoryInteractionStore::new()
                .with_score(R, R, 9.0)
                .with_score(R, A, 9.0)
                .with_score(R, 7, 1.0),
            MemoryDirectory::new().with_members(1..=8),
            10,
        );

        let ranked = f.service.recommend(R).await.unwrap();
        let result = ids(&ranked);

        assert!(!result.contains(&R));
        assert!(!result.contains(&A));
        assert!(!result.contains(&B));
        assert_eq!(result, vec![C, D, 7, 8, 6]);
    }

    #[tokio::test]
    async fn test_blacklist_in_both_directions() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new().with_score(R, 6, 5.0),
            MemoryDirectory::new()
                .with_members(1..=8)
                .with_block(R, C)
                .with_block(6, R)
                .with_block(R, 8),
            10,
        );

        let ranked = f.service.recommend(R).await.unwrap();
        let result = ids(&ranked);

        assert_eq!(result, vec![D, 7]);
    }

    #[tokio::test]
    async fn test_fallback_ranks_by_capped_interaction() {
        let f = fixture(
            MemoryGraphStore::new(),
            MemoryInteractionStore::new()
                .with_score(R, 6, 2.0)
                .with_score(R, 7, 40.0)
                .with_score(R, 8, 12.0)
                .with_score(R, 9, 7.5),
            MemoryDirectory::new().with_members(1..=9),
            3,
        );

        let ranked = f.service.recommend(R).await.unwrap();

        // 7 and 8 both cap at 10 and keep store order
        assert_eq!(ids(&ranked), vec![7, 8, 9]);
        assert!(ranked.iter().all(|c| c.depth == Depth::Unrelated));
        // all scores fetched once, no recent lookup needed
        assert_eq!(f.interactions.calls(), 1);
        assert_eq!(f.graph.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_when_friends_lead_nowhere() {
        let f = fixture(
            MemoryGraphStore::new().with_friendship(R, A),
            MemoryInteractionStore::new().with_score(R, 9, 1.0),
            MemoryDirectory::new().with_members(1..=9),
            2,
        );

        let ranked = f.service.recommend(R).await.unwrap();
        assert_eq!(ids(&ranked), vec![9, 8]);
    }

    #[tokio::test]
    async fn test_backfill_completeness() {
        // Eligible: 5 and 6 only, limit 10
        let f = fixture(
            MemoryGraphStore::new().with_friendship(R, A),
            MemoryInteractionStore::new().with_score(R, 5, 1.0),
            MemoryDirectory::new().with_members([R, A, 5, 6]),
            10,
        );

        let ranked = f.service.recommend(R).await.unwrap();
        assert_eq!(ids(&ranked), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_third_degree_when_second_degree_is_short() {
        // R - A - C - E: E is third degree through C
        let e: MemberId = 6;
        let f = fixture(
            MemoryGraphStore::new()
                .with_friendship(R, A)
                .with_friendship(A, C)
                .with_friendship(C, e),
            MemoryInteractionStore::new().with_score(R, e, 3.0),
            MemoryDirectory::new().with_members([R, A, C, e]),
            5,
        );

        let ranked = f.service.recommend(R).await.unwrap();

        assert_eq!(ids(&ranked), vec![C, e]);
        let third = &ranked[1];
        assert_eq!(third.depth, Depth::Third);
        assert_eq!(third.virtual_score(), 0.5);
        assert_eq!(third.total_score(), 23.5);
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new().with_members(1..=8),
            10,
        );
        f.interactions.set_unavailable(true);

        let err = f.service.get_recommendations(R, 0, 10).await.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_display_info_is_dropped() {
        let f = fixture(
            scenario_graph(),
            MemoryInteractionStore::new(),
            MemoryDirectory::new().with_member(D, "Dev"),
            2,
        );

        let page = f.service.get_recommendations(R, 0, 10).await.unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].member_id, D);
    }
}
