//! Configuration management for FriendRec services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (member directory)
    pub database: DatabaseConfig,

    /// Redis configuration (friend graph and interaction scores)
    pub redis: RedisConfig,

    /// Recommendation engine tuning
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Grace period for in-flight requests after a shutdown signal
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Limits and policy knobs for the recommendation engine.
///
/// Passed explicitly into traversal and backfill so tests can run the
/// engine with small limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendConfig {
    /// Cap on first-degree friends fetched per requester
    #[serde(default = "default_first_degree_scan_limit")]
    pub first_degree_scan_limit: usize,

    /// Target result size
    #[serde(default = "default_recommend_limit")]
    pub recommend_limit: usize,

    /// Largest page size a client may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Deadline covering every store call of one request
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Answer retryable store failures with an empty page
    #[serde(default = "default_enabled")]
    pub degrade_to_empty: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (per member)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often idle member buckets are evicted, in seconds
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_key_prefix() -> String { "friendrec".to_string() }
fn default_first_degree_scan_limit() -> usize { 200 }
fn default_recommend_limit() -> usize { 10 }
fn default_max_page_size() -> usize { 50 }
fn default_deadline_ms() -> u64 { 2000 }
fn default_jwt_expiration() -> u64 { 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "friendrec".to_string() }
fn default_rate_limit() -> u32 { 20 }
fn default_burst() -> u32 { 40 }
fn default_enabled() -> bool { true }
fn default_prune_interval() -> u64 { 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            first_degree_scan_limit: default_first_degree_scan_limit(),
            recommend_limit: default_recommend_limit(),
            max_page_size: default_max_page_size(),
            deadline_ms: default_deadline_ms(),
            degrade_to_empty: default_enabled(),
        }
    }
}

impl RecommendConfig {
    /// Config with small limits, handy in tests
    pub fn with_limits(first_degree_scan_limit: usize, recommend_limit: usize) -> Self {
        Self {
            first_degree_scan_limit,
            recommend_limit,
            ..Self::default()
        }
    }

    /// Deadline as Duration
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
            prune_interval_secs: default_prune_interval(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("database.url", "postgres://localhost/friendrec")?
            .set_default("redis.url", "redis://localhost:6379")?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // e.g., APP__RECOMMEND__RECOMMEND_LIMIT=20
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database.read_url.as_deref().unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/friendrec".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                key_prefix: default_key_prefix(),
            },
            recommend: RecommendConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.recommend.first_degree_scan_limit, 200);
        assert_eq!(config.recommend.recommend_limit, 10);
        assert!(config.recommend.degrade_to_empty);
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/friendrec");
    }

    #[test]
    fn test_shutdown_and_prune_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.rate_limit.prune_interval_secs, 60);
    }

    #[test]
    fn test_small_limits() {
        let config = RecommendConfig::with_limits(5, 3);
        assert_eq!(config.first_degree_scan_limit, 5);
        assert_eq!(config.recommend_limit, 3);
        assert_eq!(config.deadline(), Duration::from_millis(2000));
    }

    #[test]
    fn test_recommend_section_defaults_when_partial() {
        let config: RecommendConfig = serde_json::from_str(r#"{"recommend_limit": 25}"#).unwrap();
        assert_eq!(config.recommend_limit, 25);
        assert_eq!(config.first_degree_scan_limit, 200);
        assert_eq!(config.max_page_size, 50);
    }
}
