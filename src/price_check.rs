use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::ProductExtractor;
use crate::models::Product;
use crate::platform::PlatformClassifier;
use crate::repository::PriceRepository;
use crate::telemetry;

/// Products whose stored price moved during one cycle.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DeltaSet {
    pub changed: Vec<Product>,
    pub checked: usize,
    pub skipped: usize,
}

impl DeltaSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }
}

pub struct PriceCheckCycle {
    repository: Arc<dyn PriceRepository>,
    extractor: Arc<dyn ProductExtractor>,
    classifier: PlatformClassifier,
    inter_request_delay: Duration,
}

impl PriceCheckCycle {
    pub fn new(
        repository: Arc<dyn PriceRepository>,
        extractor: Arc<dyn ProductExtractor>,
        inter_request_delay: Duration,
    ) -> Self {
        Self {
            repository,
            extractor,
            classifier: PlatformClassifier::new(),
            inter_request_delay,
        }
    }

    /// Re-extracts every tracked product once, sequentially, and stores any price
    /// that differs from the recorded one.
    pub async fn run_cycle(&self) -> DeltaSet {
        let mut delta = DeltaSet::default();

        let products = match self.repository.find_tracked_products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load tracked products");
                return delta;
            }
        };

        tracing::info!(products = products.len(), "Starting price check cycle");

        for (index, product) in products.iter().enumerate() {
            if index > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            delta.checked += 1;
            telemetry::price_checked();

            let platform = self.classifier.classify(&product.url);
            let extraction = self.extractor.extract(&product.url, platform).await;

            let Some(price) = extraction.price else {
                tracing::warn!(product_id = %product.id, url = %product.url, "No price extracted, skipping");
                delta.skipped += 1;
                continue;
            };

            if price == product.price {
                tracing::debug!(product_id = %product.id, %price, "Price unchanged");
                continue;
            }

            match self.repository.update_price(&product.id, price).await {
                Ok(Some(updated)) => {
                    tracing::info!(
                        product_id = %updated.id,
                        previous = %updated.previous_price,
                        current = %updated.price,
                        "Price changed"
                    );
                    telemetry::price_changed();
                    delta.changed.push(updated);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(product_id = %product.id, error = %e, "Failed to store new price");
                    delta.skipped += 1;
                }
            }
        }

        tracing::info!(
            checked = delta.checked,
            changed = delta.len(),
            skipped = delta.skipped,
            "Price check cycle completed"
        );
        delta
    }
}
