use crate::types::{CacheSnapshot, KeyValueStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const CACHE_KEY: &str = "articles-cache";

/// The article snapshot, held in memory and mirrored to a [`KeyValueStore`].
///
/// Every store call is bounded by `op_timeout`. A slow, broken or corrupt
/// store degrades to the in-memory copy instead of failing the caller.
#[derive(Clone)]
pub struct ArticleCache {
    store: Arc<dyn KeyValueStore>,
    latest: Arc<RwLock<Option<CacheSnapshot>>>,
    ttl: Duration,
    op_timeout: Duration,
}

impl ArticleCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            store,
            latest: Arc::new(RwLock::new(None)),
            ttl,
            op_timeout,
        }
    }

    async fn bounded<T, F>(&self, what: &str, op: F) -> Option<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("Cache {} failed: {:#}", what, e);
                None
            }
            Err(_) => {
                warn!("Cache {} timed out after {:?}", what, self.op_timeout);
                None
            }
        }
    }

    async fn load_stored(&self) -> Option<CacheSnapshot> {
        let raw = self.bounded("read", self.store.get(CACHE_KEY)).await??;
        match serde_json::from_str::<CacheSnapshot>(&raw) {
            Ok(snapshot) => {
                debug!("Loaded {} cached articles", snapshot.articles.len());
                Some(snapshot)
            }
            Err(e) => {
                warn!("Ignoring corrupt cache entry: {}", e);
                None
            }
        }
    }

    /// The newer of the stored and in-memory snapshots.
    pub async fn load(&self) -> Option<CacheSnapshot> {
        let stored = self.load_stored().await;
        let latest = self.latest.read().await.clone();
        match (stored, latest) {
            (Some(stored), Some(latest)) if latest.updated_at > stored.updated_at => {
                debug!("Store is behind, serving the in-memory snapshot");
                Some(latest)
            }
            (Some(stored), _) => Some(stored),
            (None, latest) => latest,
        }
    }

    /// Keeps the snapshot in memory and returns whether the store took it.
    pub async fn save(&self, snapshot: &CacheSnapshot) -> bool {
        *self.latest.write().await = Some(snapshot.clone());
        let body = match serde_json::to_string(snapshot) {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not serialize cache snapshot: {}", e);
                return false;
            }
        };
        let written = self.bounded("write", self.store.set(CACHE_KEY, body, self.ttl)).await.is_some();
        if written {
            info!("Cached {} articles", snapshot.articles.len());
        }
        written
    }

    pub async fn clear(&self) -> bool {
        *self.latest.write().await = None;
        self.bounded("clear", self.store.clear(CACHE_KEY)).await.is_some()
    }
}
