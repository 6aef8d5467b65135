//! Database-backed member directory

use crate::model::MemberId;
use crate::store::{MemberDirectory, MemberDisplay};
use async_trait::async_trait;
use friendrec_common::db::Repository;
use friendrec_common::errors::{AppError, Result};
use std::collections::HashSet;

const DIRECTORY_STORE: &str = "member directory";

/// Connection and pool failures surface as an unavailable directory
fn classify(err: AppError) -> AppError {
    if err.is_retryable() {
        AppError::store_unavailable(DIRECTORY_STORE, err.to_string())
    } else {
        err
    }
}

/// [`MemberDirectory`] over the `members` and `member_blocks` tables
#[derive(Clone)]
pub struct DbMemberDirectory {
    repo: Repository,
}

impl DbMemberDirectory {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl MemberDirectory for DbMemberDirectory {
    async fn find_blacklist_ids(&self, member_id: MemberId) -> Result<HashSet<MemberId>> {
        self.repo.find_blocked_member_ids(member_id).await.map_err(classify)
    }

    async fn find_recent_member_ids(
        &self,
        exclude_ids: &HashSet<MemberId>,
        limit: usize,
    ) -> Result<Vec<MemberId>> {
        self.repo
            .find_recent_member_ids(exclude_ids, limit as u64)
            .await
            .map_err(classify)
    }

    async fn find_display_info(&self, member_ids: &[MemberId]) -> Result<Vec<MemberDisplay>> {
        let members = self
            .repo
            .find_members_by_ids(member_ids)
            .await
            .map_err(classify)?;

        Ok(members
            .into_iter()
            .map(|m| MemberDisplay {
                id: m.id,
                name: m.name,
                profile_image_url: m.profile_image_url,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let down = classify(AppError::DatabaseConnection {
            message: "pool timed out".to_string(),
        });
        assert!(matches!(down, AppError::StoreUnavailable { store: "member directory", .. }));

        let bad = classify(AppError::Internal {
            message: "bug".to_string(),
        });
        assert!(matches!(bad, AppError::Internal { .. }));
    }

    #[test]
    fn test_query_errors_are_not_outages() {
        let query: AppError = sea_orm::DbErr::Custom("relation \"members\" does not exist".to_string()).into();
        let classified = classify(query);
        assert!(matches!(classified, AppError::Database(_)));
        assert!(!classified.is_retryable());

        let pool: AppError =
            sea_orm::DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout).into();
        assert!(matches!(
            classify(pool),
            AppError::StoreUnavailable { store: "member directory", .. }
        ));
    }
}
