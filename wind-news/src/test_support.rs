use crate::normalize::placeholder_image;
use crate::types::{AiCategories, Article, Category, Province, Tag};
use chrono::{DateTime, Utc};

pub fn article(url: &str, title: &str) -> Article {
    article_at(url, title, Utc::now())
}

pub fn article_at(url: &str, title: &str, date: DateTime<Utc>) -> Article {
    Article {
        title: title.to_string(),
        description: "...".to_string(),
        source: "Test".to_string(),
        date,
        url: url.to_string(),
        image: Some(placeholder_image("").to_string()),
        tags: [Tag::Onshore].into_iter().collect(),
        category: Category::Onshore,
        province: Province::National,
        ai_categories: None,
    }
}

pub fn ai(stage: &str) -> AiCategories {
    AiCategories {
        project_stage: stage.to_string(),
        sentiment: "neutral".to_string(),
        key_topics: vec!["wind".to_string()],
        urgency: "low".to_string(),
    }
}
