// Service exports
pub mod appwrite;
pub mod cache;
pub mod locks;
pub mod memory;
pub mod store;

pub use appwrite::{AppwriteCollections, AppwriteStore};
pub use cache::{CacheError, CacheKey, CacheManager, CacheStats, CachedStore};
pub use locks::EntityLocks;
pub use memory::MemoryStore;
pub use store::{DocumentStore, StoreError};
