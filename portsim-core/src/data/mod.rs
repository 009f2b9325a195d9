//! Market data boundary: provider trait, in-memory store and LRU cache

pub mod cache;
pub mod memory;
pub mod provider;

pub use cache::{CacheCapacity, CacheStats, CachedProvider};
pub use memory::InMemoryProvider;
pub use provider::{DataProvider, PriceHistory};
