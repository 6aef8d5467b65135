//! Repository pattern for database operations
//!
//! Provides a clean interface for the member directory reads
//! with proper error handling.

use crate::errors::Result;
use crate::db::DbPool;
use crate::db::models::*;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::collections::HashSet;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Member Operations
    // ========================================================================

    /// Active members among `ids`, in no particular order
    pub async fn find_members_by_ids(&self, ids: &[i64]) -> Result<Vec<Member>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        MemberEntity::find()
            .filter(MemberColumn::Id.is_in(ids.iter().copied()))
            .filter(MemberColumn::IsActive.eq(true))
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Newest active members, skipping `exclude_ids`
    pub async fn find_recent_member_ids(
        &self,
        exclude_ids: &HashSet<i64>,
        limit: u64,
    ) -> Result<Vec<i64>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut query = MemberEntity::find()
            .select_only()
            .column(MemberColumn::Id)
            .filter(MemberColumn::IsActive.eq(true));

        if !exclude_ids.is_empty() {
            query = query.filter(MemberColumn::Id.is_not_in(exclude_ids.iter().copied()));
        }

        query
            .order_by_desc(MemberColumn::CreatedAt)
            .order_by_desc(MemberColumn::Id)
            .limit(limit)
            .into_tuple::<i64>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Blacklist Operations
    // ========================================================================

    /// Members on either side of a block involving `member_id`
    pub async fn find_blocked_member_ids(&self, member_id: i64) -> Result<HashSet<i64>> {
        let blocks = MemberBlockEntity::find()
            .filter(
                Condition::any()
                    .add(MemberBlockColumn::BlockerId.eq(member_id))
                    .add(MemberBlockColumn::BlockedId.eq(member_id)),
            )
            .all(self.read_conn())
            .await?;

        Ok(blocks
            .into_iter()
            .map(|block| {
                if block.blocker_id == member_id {
                    block.blocked_id
                } else {
                    block.blocker_id
                }
            })
            .collect())
    }
}
