//! Friend recommendation handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use friendrec_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    metrics::RequestMetrics,
};
use friendrec_recommend::{Page, RecommendedFriend};

fn default_page_size() -> usize {
    10
}

/// Query string of `GET /v1/recommendations`
#[derive(Debug, Deserialize, Validate)]
pub struct RecommendationQuery {
    /// Zero-based page index
    #[serde(default)]
    pub page: usize,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1))]
    pub page_size: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(flatten)]
    pub page: Page<RecommendedFriend>,

    /// Set when a store outage was answered with an empty page
    pub degraded: bool,
}

/// Recommendations for the authenticated member
pub async fn get_recommendations(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationsResponse>> {
    let request_metrics = RequestMetrics::start("recommendations");

    let result = recommend(&state, &auth, &query).await;

    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    };
    request_metrics.finish(status);

    result.map(Json)
}

async fn recommend(
    state: &AppState,
    auth: &AuthContext,
    query: &RecommendationQuery,
) -> Result<RecommendationsResponse> {
    query.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("page_size".to_string()),
    })?;

    let config = state.service.config();
    if query.page_size > config.max_page_size {
        return Err(AppError::Validation {
            message: format!("page_size must not exceed {}", config.max_page_size),
            field: Some("page_size".to_string()),
        });
    }

    if let Some(limiter) = &state.limiter {
        limiter.check(auth.member_id)?;
    }

    let deadline = config.deadline();
    let outcome = tokio::time::timeout(
        deadline,
        state
            .service
            .get_recommendations(auth.member_id, query.page, query.page_size),
    )
    .await
    .unwrap_or(Err(AppError::DeadlineExceeded {
        timeout_ms: config.deadline_ms,
    }));

    match outcome {
        Ok(page) => {
            tracing::info!(
                member_id = auth.member_id,
                request_id = %auth.request_id,
                page = query.page,
                items = page.items.len(),
                "Recommendations served"
            );
            Ok(RecommendationsResponse {
                page,
                degraded: false,
            })
        }
        Err(e) if e.is_retryable() && config.degrade_to_empty => {
            tracing::warn!(
                member_id = auth.member_id,
                request_id = %auth.request_id,
                error = %e,
                "Serving empty recommendations"
            );
            Ok(RecommendationsResponse {
                page: Page::empty(query.page, query.page_size),
                degraded: true,
            })
        }
        Err(e) => Err(e),
    }
}
