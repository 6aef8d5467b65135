//! Store implementations

pub mod directory;
pub mod memory;
pub mod redis;

pub use directory::DbMemberDirectory;
pub use memory::{MemoryDirectory, MemoryGraphStore, MemoryInteractionStore};
pub use self::redis::{RedisGraphStore, RedisInteractionStore};
