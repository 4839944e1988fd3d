use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::coordinator::ProductExtractor;
use crate::models::{NewProduct, Product, Tracking};
use crate::platform::PlatformClassifier;
use crate::repository::PriceRepository;
use crate::utils::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackRequest {
    #[validate(length(min = 1, max = 64))]
    pub watcher_id: String,
    #[validate(url)]
    pub url: String,
}

/// The watcher-facing operations: start, inspect and stop tracking products.
pub struct ProductManager {
    repository: Arc<dyn PriceRepository>,
    extractor: Arc<dyn ProductExtractor>,
    classifier: PlatformClassifier,
}

impl ProductManager {
    pub fn new(repository: Arc<dyn PriceRepository>, extractor: Arc<dyn ProductExtractor>) -> Self {
        Self {
            repository,
            extractor,
            classifier: PlatformClassifier::new(),
        }
    }

    /// Scrapes `url` and subscribes `watcher_id` to the resulting product. Only a
    /// malformed request is an error; a page we cannot read yields `Ok(None)`.
    pub async fn track_product(&self, request: TrackRequest) -> Result<Option<Tracking>> {
        request.validate()?;
        let url = request.url.trim();

        let parsed = url::Url::parse(url)
            .map_err(|e| AppError::Validation(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!("Unsupported URL scheme: {}", parsed.scheme())));
        }

        let platform = self.classifier.classify(url);
        let extraction = self.extractor.extract(url, platform).await;
        let (Some(name), Some(price)) = (extraction.title, extraction.price) else {
            tracing::info!(url, %platform, watcher_id = %request.watcher_id, "Failed to scrape product");
            return Ok(None);
        };

        let product = match self
            .repository
            .find_or_create_product(NewProduct {
                name,
                url: url.to_string(),
                price,
            })
            .await
        {
            Ok(product) => product,
            Err(e) => {
                tracing::error!(url, error = %e, "Failed to store product");
                return Ok(None);
            }
        };

        match self
            .repository
            .find_or_create_subscription(&request.watcher_id, &product.id)
            .await
        {
            Ok(subscription) => {
                tracing::info!(
                    watcher_id = %subscription.watcher_id,
                    product_id = %product.id,
                    product = %product.name,
                    "Tracking product"
                );
                Ok(Some(Tracking { subscription, product }))
            }
            Err(e) => {
                tracing::error!(product_id = %product.id, error = %e, "Failed to store subscription");
                Ok(None)
            }
        }
    }

    pub async fn get_product(&self, product_id: &str) -> Option<Product> {
        self.repository
            .find_product(product_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(product_id, error = %e, "Failed to load product");
                None
            })
    }

    pub async fn list_trackings(&self, watcher_id: &str) -> Vec<Tracking> {
        let subscriptions = match self.repository.find_subscriptions_by_watcher(watcher_id).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!(watcher_id, error = %e, "Failed to list subscriptions");
                return Vec::new();
            }
        };

        let mut trackings = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            if let Some(product) = self.get_product(&subscription.product_id).await {
                trackings.push(Tracking { subscription, product });
            }
        }
        trackings
    }

    /// False when the subscription does not exist or belongs to someone else.
    pub async fn stop_tracking(&self, subscription_id: &str, watcher_id: &str) -> bool {
        match self.repository.delete_subscription(subscription_id, watcher_id).await {
            Ok(deleted) => {
                if deleted {
                    tracing::info!(subscription_id, watcher_id, "Stopped tracking");
                }
                deleted
            }
            Err(e) => {
                tracing::error!(subscription_id, error = %e, "Failed to delete subscription");
                false
            }
        }
    }
}
