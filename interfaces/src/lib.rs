pub mod defs;
pub mod state;

pub use defs::{AiCategories, Article, CacheSnapshot, Category, FeedContext, Province, RawFeedItem, Tag};
pub use state::{FileStore, KeyValueStore, MemoryStore};
