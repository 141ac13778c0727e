use crate::llm_adapter::LlmAdapter;
use crate::types::{AggregatorError, AiCategories, Article, EnrichmentConfig, Result};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// One element of the model's reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategorizationEntry {
    index: usize,
    #[serde(flatten)]
    categories: AiCategories,
}

pub fn build_prompt(batch: &[&Article]) -> String {
    let mut prompt = String::from(
        "You categorize Irish wind energy news. For each numbered article below return one JSON object with:\n\
         - \"index\": the article number\n\
         - \"projectStage\": one of \"proposed\", \"planning\", \"approved\", \"construction\", \"operational\", \"policy\", \"unknown\"\n\
         - \"sentiment\": one of \"positive\", \"neutral\", \"negative\"\n\
         - \"keyTopics\": up to 4 short topic strings\n\
         - \"urgency\": one of \"low\", \"medium\", \"high\"\n\
         Reply with a JSON array only.\n\n",
    );
    for (index, article) in batch.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            prompt,
            "[{}] Title: {}\nSource: {}\nDescription: {}\n",
            index, article.title, article.source, article.description
        );
    }
    prompt
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a reply for a batch of `batch_len` articles. Anything other than
/// an array of well-formed entries rejects the whole reply; entries whose
/// index is out of range are dropped.
pub fn parse_categorization_response(text: &str, batch_len: usize) -> Result<Vec<(usize, AiCategories)>> {
    let body = strip_code_fences(text);
    let (start, end) = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(AggregatorError::Enrichment("reply contains no JSON array".to_string())),
    };
    let entries: Vec<CategorizationEntry> = serde_json::from_str(&body[start..=end])?;
    Ok(entries
        .into_iter()
        .filter(|entry| entry.index < batch_len)
        .map(|entry| (entry.index, entry.categories))
        .collect())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AiRunStats {
    pub requested: usize,
    pub categorized: usize,
    pub failed_batches: usize,
}

/// Fills `ai_categories` for articles that lack it, newest first.
pub struct AiCategorizer {
    adapter: Arc<dyn LlmAdapter>,
    config: EnrichmentConfig,
}

impl AiCategorizer {
    pub fn new(adapter: Arc<dyn LlmAdapter>, config: EnrichmentConfig) -> Self {
        Self { adapter, config }
    }

    pub async fn categorize(&self, articles: &mut [Article]) -> AiRunStats {
        let mut pending: Vec<usize> = (0..articles.len()).filter(|&i| articles[i].ai_categories.is_none()).collect();
        pending.sort_by(|&a, &b| articles[b].date.cmp(&articles[a].date));
        pending.truncate(self.config.ai_max_articles);

        let mut stats = AiRunStats { requested: pending.len(), ..Default::default() };
        if pending.is_empty() {
            return stats;
        }

        for chunk in pending.chunks(self.config.ai_batch_size.max(1)) {
            let prompt = {
                let batch: Vec<&Article> = chunk.iter().map(|&i| &articles[i]).collect();
                build_prompt(&batch)
            };

            let reply = match self.adapter.generate(&prompt).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("AI categorization request via {} failed, skipping {} articles: {}", self.adapter.adapter_name(), chunk.len(), e);
                    stats.failed_batches += 1;
                    continue;
                }
            };

            match parse_categorization_response(&reply, chunk.len()) {
                Ok(entries) => {
                    for (index, categories) in entries {
                        let article = &mut articles[chunk[index]];
                        if article.ai_categories.is_none() {
                            article.ai_categories = Some(categories);
                            stats.categorized += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!("Discarding malformed AI reply for {} articles: {}", chunk.len(), e);
                    stats.failed_batches += 1;
                }
            }
        }

        info!(
            "AI categorization: {}/{} articles categorized ({} failed batches)",
            stats.categorized, stats.requested, stats.failed_batches
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_adapter::MockLlmAdapter;
    use crate::test_support::{article, article_at};
    use chrono::{Duration, Utc};

    const GOOD: &str = r#"[{"index":0,"projectStage":"approved","sentiment":"positive","keyTopics":["Cork"],"urgency":"medium"}]"#;

    #[test]
    fn parses_plain_and_fenced_replies() {
        let parsed = parse_categorization_response(GOOD, 1).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].1.project_stage, "approved");
        assert_eq!(parsed[0].1.key_topics, vec!["Cork".to_string()]);

        let fenced = format!("```json\n{}\n```", GOOD);
        assert_eq!(parse_categorization_response(&fenced, 1).unwrap().len(), 1);

        let chatty = format!("Here you go:\n{}\nThanks", GOOD);
        assert_eq!(parse_categorization_response(&chatty, 1).unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_conforming_replies() {
        assert!(parse_categorization_response(r#"["not","an","object"]"#, 3).is_err());
        assert!(parse_categorization_response(r#"{"index":0}"#, 3).is_err());
        assert!(parse_categorization_response("no json here", 3).is_err());
        assert!(parse_categorization_response(r#"[{"index":0,"sentiment":"positive"}]"#, 3).is_err());
    }

    #[test]
    fn out_of_range_indices_are_dropped() {
        let reply = GOOD.replace("\"index\":0", "\"index\":7");
        assert!(parse_categorization_response(&reply, 2).unwrap().is_empty());
    }

    #[test]
    fn prompt_numbers_from_zero() {
        let a = article("https://a.ie/1", "First");
        let b = article("https://a.ie/2", "Second");
        let prompt = build_prompt(&[&a, &b]);
        assert!(prompt.contains("[0] Title: First"));
        assert!(prompt.contains("[1] Title: Second"));
    }

    #[tokio::test]
    async fn non_object_array_leaves_batch_uncategorized() {
        let adapter = Arc::new(MockLlmAdapter::new("bad".to_string()).with_response(r#"["not","an","object"]"#));
        let categorizer = AiCategorizer::new(adapter, EnrichmentConfig::default());
        let mut articles = vec![article("https://a.ie/1", "One"), article("https://a.ie/2", "Two")];

        let stats = categorizer.categorize(&mut articles).await;
        assert_eq!(stats, AiRunStats { requested: 2, categorized: 0, failed_batches: 1 });
        assert!(articles.iter().all(|a| a.ai_categories.is_none()));
    }

    #[tokio::test]
    async fn newest_articles_are_categorized_first() {
        let adapter = Arc::new(MockLlmAdapter::new("ok".to_string()));
        let config = EnrichmentConfig { ai_max_articles: 1, ..EnrichmentConfig::default() };
        let categorizer = AiCategorizer::new(adapter, config);
        let now = Utc::now();
        let mut articles = vec![
            article_at("https://a.ie/old", "Old", now - Duration::days(2)),
            article_at("https://a.ie/new", "New", now),
        ];

        let stats = categorizer.categorize(&mut articles).await;
        assert_eq!(stats.categorized, 1);
        assert!(articles[0].ai_categories.is_none());
        assert!(articles[1].ai_categories.is_some());
    }

    #[tokio::test]
    async fn already_categorized_articles_are_not_sent() {
        let adapter = Arc::new(MockLlmAdapter::new("ok".to_string()));
        let categorizer = AiCategorizer::new(adapter.clone(), EnrichmentConfig::default());
        let mut done = article("https://a.ie/1", "Done");
        done.ai_categories = Some(crate::test_support::ai("operational"));
        let mut articles = vec![done];

        let stats = categorizer.categorize(&mut articles).await;
        assert_eq!(stats.requested, 0);
        assert_eq!(adapter.calls(), 0);
    }
}
