use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{PriceAlert, Subscription};
use crate::plugins::traits::NotifierPlugin;
use crate::price_check::DeltaSet;
use crate::repository::PriceRepository;
use crate::telemetry;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanoutReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends one alert per subscriber for every product in a delta set.
pub struct NotificationFanout {
    repository: Arc<dyn PriceRepository>,
    notifier: Arc<dyn NotifierPlugin>,
    currency_symbol: String,
}

impl NotificationFanout {
    pub fn new(
        repository: Arc<dyn PriceRepository>,
        notifier: Arc<dyn NotifierPlugin>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            notifier,
            currency_symbol: currency_symbol.into(),
        }
    }

    pub async fn notify(&self, delta: &DeltaSet) -> FanoutReport {
        let mut report = FanoutReport::default();

        for product in &delta.changed {
            let subscriptions = match self.repository.find_subscriptions_by_product(&product.id).await {
                Ok(subscriptions) => subscriptions,
                Err(e) => {
                    tracing::error!(product_id = %product.id, error = %e, "Failed to resolve subscribers");
                    continue;
                }
            };

            if subscriptions.is_empty() {
                tracing::debug!(product_id = %product.id, "Price changed but nobody is subscribed");
                continue;
            }

            let message = PriceAlert::from_product(product).render(&self.currency_symbol);
            let outcomes = join_all(
                subscriptions
                    .iter()
                    .map(|subscription| self.deliver(subscription, &message)),
            )
            .await;

            let sent = outcomes.iter().filter(|delivered| **delivered).count();
            report.sent += sent;
            report.failed += outcomes.len() - sent;
        }

        telemetry::notifications(report.sent as u64, report.failed as u64);
        if report.sent + report.failed > 0 {
            tracing::info!(sent = report.sent, failed = report.failed, "Notification fan-out completed");
        }
        report
    }

    async fn deliver(&self, subscription: &Subscription, message: &str) -> bool {
        match self.notifier.notify(&subscription.watcher_id, message).await {
            Ok(result) if result.success => true,
            Ok(result) => {
                tracing::warn!(
                    watcher_id = %subscription.watcher_id,
                    notifier = self.notifier.plugin_type(),
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Notification rejected"
                );
                false
            }
            Err(e) => {
                tracing::warn!(
                    watcher_id = %subscription.watcher_id,
                    notifier = self.notifier.plugin_type(),
                    error = %e,
                    "Notification failed"
                );
                false
            }
        }
    }
}
