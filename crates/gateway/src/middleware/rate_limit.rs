//! Per-member rate limiting using token buckets

use friendrec_common::config::RateLimitConfig;
use friendrec_common::errors::{AppError, Result};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One token bucket per member id
pub struct MemberRateLimiter {
    limiter: DefaultKeyedRateLimiter<i64>,
    requests_per_second: u32,
}

impl MemberRateLimiter {
    /// Create a limiter; both rates must be non-zero
    pub fn new(requests_per_second: u32, burst: u32) -> Result<Self> {
        let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| AppError::Configuration {
            message: "rate_limit.requests_per_second must be positive".to_string(),
        })?;
        let burst = NonZeroU32::new(burst).ok_or_else(|| AppError::Configuration {
            message: "rate_limit.burst must be positive".to_string(),
        })?;

        Ok(Self {
            limiter: RateLimiter::keyed(Quota::per_second(rate).allow_burst(burst)),
            requests_per_second,
        })
    }

    /// Limiter for the configured quota, `None` when limiting is off
    pub fn from_config(config: &RateLimitConfig) -> Result<Option<Arc<Self>>> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(config.requests_per_second, config.burst).map(|l| Some(Arc::new(l)))
    }

    /// Take one token from `member_id`'s bucket
    pub fn check(&self, member_id: i64) -> Result<()> {
        self.limiter.check_key(&member_id).map_err(|_| {
            tracing::warn!(member_id, "Rate limit exceeded");
            AppError::RateLimited {
                limit: self.requests_per_second,
            }
        })
    }

    /// Drop buckets that have refilled to capacity, returning how many remain
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    /// Members currently holding a bucket
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }

    /// Prune idle buckets every `every` until the runtime shuts down
    pub fn spawn_pruner(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let held = limiter.prune();
                tracing::debug!(held, "Pruned idle rate limit buckets");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_per_member() {
        let limiter = MemberRateLimiter::new(1, 2).unwrap();

        tokio_test::assert_ok!(limiter.check(7));
        tokio_test::assert_ok!(limiter.check(7));
        assert!(matches!(limiter.check(7), Err(AppError::RateLimited { limit: 1 })));
        tokio_test::assert_ok!(limiter.check(8));
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        assert!(MemberRateLimiter::new(0, 5).is_err());
        assert!(MemberRateLimiter::new(5, 0).is_err());
    }

    #[test]
    fn test_idle_buckets_are_pruned() {
        let limiter = MemberRateLimiter::new(1000, 1).unwrap();
        for member_id in 1..=500 {
            tokio_test::assert_ok!(limiter.check(member_id));
        }
        assert_eq!(limiter.len(), 500);

        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(limiter.prune(), 0);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_pruning_keeps_throttled_members() {
        let limiter = MemberRateLimiter::new(1, 1).unwrap();
        tokio_test::assert_ok!(limiter.check(7));

        assert_eq!(limiter.prune(), 1);
        assert!(matches!(limiter.check(7), Err(AppError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_pruner_task_evicts_idle_members() {
        let limiter = Arc::new(MemberRateLimiter::new(1000, 1).unwrap());
        for member_id in 1..=100 {
            tokio_test::assert_ok!(limiter.check(member_id));
        }

        let pruner = limiter.spawn_pruner(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;
        pruner.abort();

        assert!(limiter.is_empty());
    }

    #[test]
    fn test_disabled() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        assert!(MemberRateLimiter::from_config(&config).unwrap().is_none());
    }
}
