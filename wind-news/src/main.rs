mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wind_news::sources::default_feed_urls;
use wind_news::{
    AiCategorizer, ArticleCache, ArticleQuery, EnrichmentConfig, EnrichmentCoordinator, FetchConfig, Fetcher,
    FileStore, GeminiAdapter, ImageEnricher, KeyValueStore, MemoryStore, NewsAggregator, NewsPipeline,
    PipelineConfig, RefreshScheduler, RssFeedSource, ServiceConfig,
};

fn build_aggregator(cli: &Cli) -> anyhow::Result<NewsAggregator> {
    let fetch_config = FetchConfig {
        feed_timeout: Duration::from_millis(cli.feed_timeout_ms),
        ..FetchConfig::default()
    };
    let fetcher = Arc::new(Fetcher::new(fetch_config).context("building HTTP client")?);

    let store: Arc<dyn KeyValueStore> = match &cli.cache_dir {
        Some(dir) => {
            info!("Using file cache in {}", dir.display());
            Arc::new(FileStore::new(dir))
        }
        None => {
            warn!("No cache directory configured, articles are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let pipeline_config = PipelineConfig::default();
    let cache = ArticleCache::new(store, pipeline_config.cache_ttl, pipeline_config.cache_op_timeout);

    let enrichment_config = EnrichmentConfig {
        enrich_images: !cli.no_images,
        ..EnrichmentConfig::default()
    };
    let mut enrichment = EnrichmentCoordinator::new();
    if enrichment_config.enrich_images {
        enrichment = enrichment.with_images(ImageEnricher::new(
            fetcher.clone(),
            enrichment_config.clone(),
            pipeline_config.image_policy,
        ));
    }
    match cli.gemini_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            let adapter = GeminiAdapter::new(fetcher.client().clone(), key)
                .with_model(cli.gemini_model.clone())
                .with_retries(enrichment_config.ai_max_retries, enrichment_config.ai_retry_delay);
            enrichment = enrichment.with_ai(AiCategorizer::new(Arc::new(adapter), enrichment_config.clone()));
        }
        None => info!("GEMINI_API_KEY not set, AI categorization disabled"),
    }

    let mut pipeline = NewsPipeline::new(cache, pipeline_config).with_enrichment(enrichment);
    for url in default_feed_urls().into_iter().chain(cli.feeds.iter().cloned()) {
        pipeline.add_source(Box::new(RssFeedSource::new(url, fetcher.clone())));
    }

    let scheduler = Arc::new(RefreshScheduler::new(Arc::new(pipeline)));
    let interval = cli.refresh_interval();
    let service_config = ServiceConfig {
        fresh_for: interval,
        refresh_interval: interval,
        refresh_secret: cli.cron_secret.clone().filter(|s| !s.is_empty()),
        ..ServiceConfig::default()
    };
    Ok(NewsAggregator::new(scheduler, service_config))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let aggregator = build_aggregator(&cli)?;

    match cli.command {
        Command::Serve => {
            info!("Starting wind-news, refreshing every {} minutes", cli.interval_minutes);
            tokio::select! {
                _ = aggregator.run_scheduler() => {}
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
        }
        Command::Fetch(args) => {
            let query = ArticleQuery {
                provinces: args.provinces,
                tags: args.tags,
                search: args.search,
                page: args.page,
                page_size: args.page_size,
                force_refresh: args.force,
            };
            print_json(&aggregator.get_articles(query).await)?;
        }
        Command::Refresh { authorization } => {
            let response = aggregator.refresh(authorization.as_deref()).await?;
            print_json(&response)?;
        }
        Command::Health => print_json(&aggregator.health().await)?,
        Command::ClearCache { authorization } => {
            if !aggregator.clear_cache(authorization.as_deref()).await? {
                anyhow::bail!("could not clear the article cache");
            }
            info!("Cache cleared");
        }
    }

    Ok(())
}
