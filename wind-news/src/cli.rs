//! Command-line interface for the wind-news service.
//!
//! Every option can also come from the environment, which is how the
//! service is configured when deployed.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use wind_news::{Province, Tag};

#[derive(Parser, Debug)]
#[command(author, version, about = "Irish wind-energy news aggregator")]
pub struct Cli {
    /// Directory for the persistent article cache. In-memory when unset.
    #[arg(long, env = "WIND_NEWS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Minutes between scheduled refreshes
    #[arg(long, env = "WIND_NEWS_REFRESH_MINUTES", default_value_t = 15)]
    pub interval_minutes: u64,

    /// Per-feed fetch timeout in milliseconds
    #[arg(long, env = "WIND_NEWS_FEED_TIMEOUT_MS", default_value_t = 3000)]
    pub feed_timeout_ms: u64,

    /// Extra feed URLs, added to the built-in list
    #[arg(long = "feed", env = "WIND_NEWS_FEEDS", value_delimiter = ',')]
    pub feeds: Vec<String>,

    /// Skip scraping article pages for images
    #[arg(long)]
    pub no_images: bool,

    /// Gemini API key. AI categorization is off without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = wind_news::llm_adapter::GEMINI_DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Shared secret required for manual refreshes
    #[arg(long, env = "CRON_SECRET", hide_env_values = true)]
    pub cron_secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1).saturating_mul(60))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh on startup and then on every interval
    Serve,
    /// Print the article list as JSON, refreshing first if the cache is stale
    Fetch(FetchArgs),
    /// Force a refresh, as the cron endpoint would
    Refresh {
        /// Value of the Authorization header, e.g. "Bearer <secret>"
        #[arg(long)]
        authorization: Option<String>,
    },
    /// Print cache status as JSON
    Health,
    /// Delete the stored article snapshot
    ClearCache {
        /// Value of the Authorization header, e.g. "Bearer <secret>"
        #[arg(long)]
        authorization: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    #[arg(long = "province")]
    pub provinces: Vec<Province>,

    #[arg(long = "tag")]
    pub tags: Vec<Tag>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = 0)]
    pub page_size: usize,

    /// Refresh even if the cache is fresh
    #[arg(long)]
    pub force: bool,
}
