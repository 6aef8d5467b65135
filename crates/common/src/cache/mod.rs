//! Redis integration
//!
//! Provides:
//! - Multiplexed connection management
//! - Set and sorted-set reads used by the friend graph and interaction stores
//! - Pipelined batch reads (one round trip per batch)

use crate::errors::{AppError, Result};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::debug;

/// Redis client configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "friendrec".to_string(),
        }
    }
}

impl From<&crate::config::RedisConfig> for CacheConfig {
    fn from(config: &crate::config::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }
}

/// Redis client
pub struct Cache {
    connection: MultiplexedConnection,
    config: CacheConfig,
}

impl Cache {
    /// Create a new client and open a multiplexed connection
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to create Redis client: {}", e)
            })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self { connection, config })
    }

    /// Build a prefixed key
    pub fn key(&self, key: &str) -> String {
        keys::prefixed(&self.config.key_prefix, key)
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Up to `count` members of a set
    pub async fn set_members_sample(&self, key: &str, count: usize) -> Result<Vec<String>> {
        let full_key = self.key(key);
        let mut conn = self.conn();

        let members: Vec<String> = conn
            .srandmember_multiple(&full_key, count)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to sample set '{}': {}", full_key, e),
            })?;

        debug!(key = %full_key, count = members.len(), "Set sample");
        Ok(members)
    }

    /// Members of many sets in one pipelined round trip, in key order
    pub async fn set_members_batch(&self, keys: &[String]) -> Result<Vec<Vec<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.smembers(self.key(key));
        }

        let mut conn = self.conn();
        let members: Vec<Vec<String>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to read {} sets: {}", keys.len(), e),
            })?;

        debug!(sets = keys.len(), "Pipelined set read");
        Ok(members)
    }

    /// Score of one sorted-set member
    pub async fn sorted_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let full_key = self.key(key);
        let mut conn = self.conn();

        conn.zscore(&full_key, member)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to read score from '{}': {}", full_key, e),
            })
    }

    /// Scores of many members of one sorted set (ZMSCORE), in member order
    pub async fn sorted_scores(&self, key: &str, members: &[String]) -> Result<Vec<Option<f64>>> {
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let full_key = self.key(key);
        let mut conn = self.conn();

        redis::cmd("ZMSCORE")
            .arg(&full_key)
            .arg(members)
            .query_async::<Vec<Option<f64>>>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to read {} scores from '{}': {}", members.len(), full_key, e),
            })
    }

    /// Whole sorted set, highest score first
    pub async fn sorted_desc(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let full_key = self.key(key);
        let mut conn = self.conn();

        let entries: Vec<(String, f64)> = conn
            .zrevrange_withscores(&full_key, 0, -1)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to read sorted set '{}': {}", full_key, e),
            })?;

        debug!(key = %full_key, entries = entries.len(), "Sorted set read");
        Ok(entries)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// Key builder helpers
pub mod keys {
    /// Join a namespace prefix and a key
    pub fn prefixed(prefix: &str, key: &str) -> String {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", prefix, key)
        }
    }

    /// Set of a member's direct friends
    pub fn friends(member_id: i64) -> String {
        format!("friends:{}", member_id)
    }

    /// Sorted set of a member's interaction scores, keyed by counterpart
    pub fn interaction(member_id: i64) -> String {
        format!("interaction:{}", member_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(keys::friends(7), "friends:7");
        assert_eq!(keys::interaction(7), "interaction:7");
    }

    #[test]
    fn test_prefixed() {
        assert_eq!(keys::prefixed("friendrec", "friends:1"), "friendrec:friends:1");
        assert_eq!(keys::prefixed("", "friends:1"), "friends:1");
    }

    #[test]
    fn test_config_from_redis_section() {
        let section = crate::config::RedisConfig {
            url: "redis://cache:6379".to_string(),
            key_prefix: "social".to_string(),
        };
        let config = CacheConfig::from(&section);
        assert_eq!(config.url, "redis://cache:6379");
        assert_eq!(config.key_prefix, "social");
    }
}
