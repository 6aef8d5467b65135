//! FriendRec Common Library
//!
//! Shared code for the FriendRec services including:
//! - Member directory models and repository
//! - Redis client for the graph and interaction stores
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::{AppConfig, RecommendConfig};
pub use db::{DbPool, Repository};
pub use cache::{Cache, CacheConfig};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
