use async_trait::async_trait;

use crate::models::Platform;
use crate::platform::PlatformClassifier;
use crate::plugins::traits::{Extraction, ExtractorPlugin};
use crate::plugins::PluginManager;
use crate::telemetry;
use crate::utils::Result;

/// Anything that can turn a product URL into a title and price. Never fails:
/// problems are logged and reported as an absent result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductExtractor: Send + Sync {
    async fn extract(&self, url: &str, platform: Platform) -> Extraction;
}

/// Runs the platform strategy for a URL and falls back to the generic strategy when
/// it errors or comes back without both a title and a price.
#[derive(Clone)]
pub struct ExtractionCoordinator {
    plugins: PluginManager,
    classifier: PlatformClassifier,
}

impl ExtractionCoordinator {
    pub fn new(plugins: PluginManager) -> Self {
        Self {
            plugins,
            classifier: PlatformClassifier::new(),
        }
    }

    pub fn classify(&self, url: &str) -> Platform {
        self.classifier.classify(url)
    }

    async fn run_strategy(&self, platform: Platform, url: &str) -> Result<Extraction> {
        let extractor = self.plugins.extractor(platform).await?;
        Self::run(extractor.as_ref(), url).await
    }

    async fn run(extractor: &dyn ExtractorPlugin, url: &str) -> Result<Extraction> {
        let page = extractor.fetch(url).await?;
        Ok(extractor.read(&page))
    }
}

#[async_trait]
impl ProductExtractor for ExtractionCoordinator {
    async fn extract(&self, url: &str, platform: Platform) -> Extraction {
        if platform != Platform::Generic {
            match self.run_strategy(platform, url).await {
                Ok(extraction) if extraction.is_complete() => return extraction,
                Ok(extraction) => {
                    tracing::info!(
                        url,
                        %platform,
                        has_title = extraction.title.is_some(),
                        has_price = extraction.price.is_some(),
                        "Platform strategy incomplete, trying generic lookup"
                    );
                }
                Err(e) => {
                    tracing::warn!(url, %platform, error = %e, "Platform strategy failed, trying generic lookup");
                }
            }
            telemetry::extraction_fell_back();
        }

        match self.run_strategy(Platform::Generic, url).await {
            Ok(extraction) => {
                if !extraction.is_complete() {
                    tracing::warn!(url, "Generic lookup could not extract product");
                }
                extraction
            }
            Err(e) => {
                tracing::error!(url, error = %e, "Generic lookup failed");
                Extraction::absent()
            }
        }
    }
}
