use crate::types::FeedOutcome;
use async_trait::async_trait;

/// Anything the refresh cycle can pull raw items from.
#[async_trait]
pub trait PullFeed: Send + Sync {
    /// The feed URL, also used for logging and reports.
    fn feed_url(&self) -> &str;

    /// Fetch and parse. Failures are reported in the outcome, never raised,
    /// so one broken feed cannot stop the others.
    async fn pull(&self) -> FeedOutcome;
}
