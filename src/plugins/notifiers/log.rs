use async_trait::async_trait;

use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::Result;

/// Writes alerts to the application log. Used when no bot token is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifierPlugin for LogNotifier {
    fn name(&self) -> &str {
        "Log Notifier"
    }

    fn plugin_type(&self) -> &str {
        "log"
    }

    async fn notify(&self, watcher_id: &str, message: &str) -> Result<NotificationResult> {
        tracing::info!(watcher_id, "Price alert:\n{}", message);
        Ok(NotificationResult::delivered(None))
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}
