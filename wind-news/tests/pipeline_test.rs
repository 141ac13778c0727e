mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wind_news::cache::CACHE_KEY;
use wind_news::normalize::is_placeholder_image;
use wind_news::{
    AiCategories, AiCategorizer, Article, CacheSnapshot, Category, EnrichmentConfig, EnrichmentCoordinator,
    ImageEnricher, ImagePolicy, KeyValueStore, MemoryStore, MockLlmAdapter, Province, Tag,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn failing_feeds_do_not_block_the_others() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/good",
        rss("Wind Weekly", &[
            item("New offshore wind farm planning approval granted near Cork Harbour", "https://example.ie/cork"),
            item("Turbine delivery for Donegal site", "https://example.ie/donegal"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let feeds = vec![
        format!("{}/broken", server.uri()),
        format!("{}/good", server.uri()),
        format!("{}/garbage", server.uri()),
    ];
    let pipeline = pipeline_for(&feeds, memory_cache(store.clone()), EnrichmentCoordinator::new());

    let report = pipeline.run_cycle().await;
    info!("Report: {:?}", report);
    assert_eq!(report.feeds_total, 3);
    assert_eq!(report.feeds_failed, 2);
    assert_eq!(report.fresh_articles, 2);
    assert!(report.cache_written);

    let snapshot = pipeline.cache().load().await.expect("snapshot written");
    assert_eq!(snapshot.articles.len(), 2);

    let cork = snapshot.articles.iter().find(|a| a.url == "https://example.ie/cork").expect("cork article");
    assert_eq!(cork.province, Province::Munster);
    assert_eq!(cork.category, Category::Offshore);
    assert!(cork.tags.contains(&Tag::Offshore) && cork.tags.contains(&Tag::Planning));
    assert_eq!(cork.source, "Wind Weekly");

    let donegal = snapshot.articles.iter().find(|a| a.url == "https://example.ie/donegal").expect("donegal article");
    assert_eq!(donegal.province, Province::Ulster);

    // The raw stored value is the camelCase JSON the dashboard reads.
    let raw = store.get(CACHE_KEY).await?.expect("raw value");
    assert!(raw.contains("\"updatedAt\""));
    Ok(())
}

#[tokio::test]
async fn same_story_from_two_feeds_is_kept_once() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "/a", rss("A", &[item("Wind Farm Approved in Cork", "https://a.ie/story")])).await;
    mount_feed(&server, "/b", rss("B", &[item("wind farm approved in cork", "https://b.ie/story")])).await;

    let feeds = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
    let pipeline = pipeline_for(&feeds, memory_cache(Arc::new(MemoryStore::new())), EnrichmentCoordinator::new());

    let report = pipeline.run_cycle().await;
    assert_eq!(report.items_seen, 2);
    assert_eq!(report.fresh_articles, 1);

    let snapshot = pipeline.cache().load().await.expect("snapshot");
    assert_eq!(snapshot.articles.len(), 1);
    assert_eq!(snapshot.articles[0].url, "https://a.ie/story");
    Ok(())
}

fn cached_article(url: &str, age: ChronoDuration, stage: &str) -> Article {
    Article {
        title: format!("Cached {}", url),
        description: "...".to_string(),
        source: "Cache".to_string(),
        date: Utc::now() - age,
        url: url.to_string(),
        image: None,
        tags: [Tag::Onshore].into_iter().collect(),
        category: Category::Onshore,
        province: Province::National,
        ai_categories: Some(AiCategories {
            project_stage: stage.to_string(),
            sentiment: "positive".to_string(),
            key_topics: vec![],
            urgency: "low".to_string(),
        }),
    }
}

#[tokio::test]
async fn cached_enrichment_survives_and_old_articles_expire() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "/feed", rss("Feed", &[item("Onshore wind output up", "https://x.ie/new")])).await;

    let store = Arc::new(MemoryStore::new());
    let cache = memory_cache(store.clone());
    let seeded = CacheSnapshot {
        articles: vec![
            cached_article("https://x.ie/recent", ChronoDuration::days(2), "approved"),
            cached_article("https://x.ie/ancient", ChronoDuration::days(9), "operational"),
        ],
        updated_at: Utc::now() - ChronoDuration::hours(1),
    };
    assert!(cache.save(&seeded).await);

    let pipeline = pipeline_for(&[format!("{}/feed", server.uri())], cache, EnrichmentCoordinator::new());
    let report = pipeline.run_cycle().await;
    assert_eq!(report.merged_articles, 2);

    let snapshot = pipeline.cache().load().await.expect("snapshot");
    let urls: Vec<_> = snapshot.articles.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, vec!["https://x.ie/new", "https://x.ie/recent"]);
    assert_eq!(
        snapshot.articles[1].ai_categories.as_ref().map(|c| c.project_stage.as_str()),
        Some("approved")
    );
    Ok(())
}

#[tokio::test]
async fn corrupt_cache_is_treated_as_empty() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "/feed", rss("Feed", &[item("Wind energy story", "https://x.ie/1")])).await;

    let store = Arc::new(MemoryStore::new());
    store.set(CACHE_KEY, "{not json".to_string(), Duration::from_secs(60)).await?;

    let pipeline = pipeline_for(&[format!("{}/feed", server.uri())], memory_cache(store), EnrichmentCoordinator::new());
    let report = pipeline.run_cycle().await;
    assert!(report.cache_written);
    assert_eq!(pipeline.cache().load().await.expect("snapshot").articles.len(), 1);
    Ok(())
}

#[tokio::test]
async fn non_conforming_ai_reply_is_skipped() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/feed",
        rss("Feed", &[item("Story one", "https://x.ie/1"), item("Story two", "https://x.ie/2")]),
    )
    .await;

    let adapter = Arc::new(MockLlmAdapter::new("bad".to_string()).with_response(r#"["not","an","object"]"#));
    let enrichment = EnrichmentCoordinator::new().with_ai(AiCategorizer::new(adapter.clone(), EnrichmentConfig::default()));
    let pipeline = pipeline_for(
        &[format!("{}/feed", server.uri())],
        memory_cache(Arc::new(MemoryStore::new())),
        enrichment,
    );

    let report = pipeline.run_cycle().await;
    assert_eq!(adapter.calls(), 1);
    assert_eq!(report.enrichment.ai_requested, 2);
    assert_eq!(report.enrichment.ai_categorized, 0);
    assert_eq!(report.enrichment.ai_batches_failed, 1);
    assert!(report.cache_written);

    let snapshot = pipeline.cache().load().await.expect("snapshot");
    assert!(snapshot.articles.iter().all(|a| a.ai_categories.is_none()));
    Ok(())
}

#[tokio::test]
async fn ai_categories_are_filled_and_kept() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "/feed", rss("Feed", &[item("Story one", "https://x.ie/1")])).await;

    let adapter = Arc::new(MockLlmAdapter::new("ok".to_string()));
    let enrichment = EnrichmentCoordinator::new().with_ai(AiCategorizer::new(adapter.clone(), EnrichmentConfig::default()));
    let pipeline = pipeline_for(
        &[format!("{}/feed", server.uri())],
        memory_cache(Arc::new(MemoryStore::new())),
        enrichment,
    );

    assert_eq!(pipeline.run_cycle().await.enrichment.ai_categorized, 1);
    // Second run: nothing left to categorize, the stored categories stay.
    let second = pipeline.run_cycle().await;
    assert_eq!(second.enrichment.ai_requested, 0);
    assert_eq!(adapter.calls(), 1);
    let snapshot = pipeline.cache().load().await.expect("snapshot");
    assert!(snapshot.articles[0].ai_categories.is_some());
    Ok(())
}

#[tokio::test]
async fn placeholder_images_are_replaced_from_the_article_page() -> anyhow::Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    let good_page = format!("{}/articles/good", server.uri());
    let missing_page = format!("{}/articles/missing", server.uri());
    mount_feed(
        &server,
        "/feed",
        rss("Feed", &[item("Offshore story", &good_page), item("Onshore story", &missing_page)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/articles/good"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><meta property="og:image" content="https://cdn.example.ie/turbines.jpg"></head></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/articles/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = test_fetcher();
    let config = EnrichmentConfig { image_batch_delay: Duration::ZERO, ..EnrichmentConfig::default() };
    let enrichment = EnrichmentCoordinator::new().with_images(ImageEnricher::new(fetcher, config, ImagePolicy::Strict));
    let pipeline = pipeline_for(
        &[format!("{}/feed", server.uri())],
        memory_cache(Arc::new(MemoryStore::new())),
        enrichment,
    );

    let report = pipeline.run_cycle().await;
    assert_eq!(report.enrichment.images_attempted, 2);
    assert_eq!(report.enrichment.images_found, 1);

    let snapshot = pipeline.cache().load().await.expect("snapshot");
    let good = snapshot.articles.iter().find(|a| a.url == good_page).expect("good");
    assert_eq!(good.image.as_deref(), Some("https://cdn.example.ie/turbines.jpg"));
    let missing = snapshot.articles.iter().find(|a| a.url == missing_page).expect("missing");
    assert!(missing.image.as_deref().is_some_and(is_placeholder_image));
    Ok(())
}
