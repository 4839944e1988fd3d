use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::extractors::{AmazonExtractor, FlipkartExtractor, GenericExtractor};
use super::notifiers::{LogNotifier, TelegramNotifier};
use super::traits::{ExtractorPlugin, NotifierPlugin};
use crate::config::{NotificationsConfig, ScraperConfig};
use crate::models::Platform;
use crate::utils::error::AppError;

pub type ExtractorPluginRef = Arc<dyn ExtractorPlugin>;
pub type NotifierPluginRef = Arc<dyn NotifierPlugin>;

/// Registry of the extraction strategies (keyed by platform) and delivery channels.
#[derive(Clone)]
pub struct PluginManager {
    extractors: Arc<RwLock<HashMap<Platform, ExtractorPluginRef>>>,
    notifiers: Arc<RwLock<HashMap<String, NotifierPluginRef>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            extractors: Arc::new(RwLock::new(HashMap::new())),
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an extractor, replacing any previous one for the same platform
    pub async fn register_extractor(&self, plugin: ExtractorPluginRef) {
        let platform = plugin.platform();
        tracing::debug!(%platform, name = plugin.name(), "Registering extractor");

        let mut extractors = self.extractors.write().await;
        extractors.insert(platform, plugin);
    }

    /// Register a notifier plugin
    pub async fn register_notifier(&self, plugin: NotifierPluginRef) {
        let plugin_type = plugin.plugin_type().to_string();

        let mut notifiers = self.notifiers.write().await;
        notifiers.insert(plugin_type, plugin);
    }

    pub async fn extractor(&self, platform: Platform) -> Result<ExtractorPluginRef, AppError> {
        let extractors = self.extractors.read().await;
        extractors.get(&platform).cloned().ok_or_else(|| AppError::Plugin {
            plugin_type: platform.to_string(),
            message: "no extractor registered".to_string(),
        })
    }

    pub async fn notifier(&self, plugin_type: &str) -> Result<NotifierPluginRef, AppError> {
        let notifiers = self.notifiers.read().await;
        notifiers.get(plugin_type).cloned().ok_or_else(|| AppError::Plugin {
            plugin_type: plugin_type.to_string(),
            message: "notifier plugin not found".to_string(),
        })
    }

    /// Check if an extractor is registered for a platform
    pub async fn has_extractor(&self, platform: Platform) -> bool {
        let extractors = self.extractors.read().await;
        extractors.contains_key(&platform)
    }

    /// List all available notifier types
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.keys().cloned().collect()
    }

    /// Registers the three storefront strategies and the delivery channel the
    /// configuration selects: Telegram when a bot token is present, the log otherwise.
    /// Returns the plugin type of the active notifier.
    pub async fn initialize_default_plugins(
        &self,
        scraper: &ScraperConfig,
        notifications: &NotificationsConfig,
    ) -> Result<String, AppError> {
        self.register_extractor(Arc::new(AmazonExtractor::new(scraper.request_timeout())?))
            .await;
        self.register_extractor(Arc::new(FlipkartExtractor::new(scraper.request_timeout())?))
            .await;
        self.register_extractor(Arc::new(GenericExtractor::with_price_history(
            &scraper.lookup_base_url,
            scraper.fallback_timeout(),
        )?))
        .await;

        let notifier: NotifierPluginRef = match &notifications.telegram.bot_token {
            Some(token) if !token.trim().is_empty() => {
                Arc::new(TelegramNotifier::new(&notifications.telegram, token.trim())?)
            }
            _ => {
                tracing::warn!("No Telegram bot token configured, alerts will only be logged");
                Arc::new(LogNotifier::new())
            }
        };
        let active = notifier.plugin_type().to_string();
        self.register_notifier(notifier).await;

        Ok(active)
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
