//! Best-effort enrichment of merged articles. Each enricher is optional and
//! a failure inside one only costs the articles it was working on.

pub mod ai;
pub mod images;

pub use ai::{build_prompt, parse_categorization_response, AiCategorizer, AiRunStats};
pub use images::{extract_page_image, EnrichOutcome, ImageEnricher};

use crate::types::{Article, EnrichmentReport};
use tracing::debug;

#[derive(Default)]
pub struct EnrichmentCoordinator {
    images: Option<ImageEnricher>,
    ai: Option<AiCategorizer>,
}

impl EnrichmentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(mut self, images: ImageEnricher) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_ai(mut self, ai: AiCategorizer) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    pub async fn enrich(&self, articles: &mut [Article]) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        match &self.images {
            Some(images) => {
                let (attempted, found) = images.enrich(articles).await;
                report.images_attempted = attempted;
                report.images_found = found;
            }
            None => debug!("Image enrichment disabled"),
        }

        match &self.ai {
            Some(ai) => {
                let stats = ai.categorize(articles).await;
                report.ai_requested = stats.requested;
                report.ai_categorized = stats.categorized;
                report.ai_batches_failed = stats.failed_batches;
            }
            None => debug!("AI categorization disabled (no adapter configured)"),
        }

        report
    }
}
