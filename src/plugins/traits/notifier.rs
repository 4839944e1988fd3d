use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Trait for implementing outbound delivery channels (Telegram, log, ...)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Delivers one rendered message to one watcher.
    async fn notify(&self, watcher_id: &str, message: &str) -> Result<NotificationResult>;
    async fn test_connection(&self) -> Result<bool>;
}
