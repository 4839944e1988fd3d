use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::TelegramConfig;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

#[derive(Debug)]
enum SendError {
    /// Worth another attempt: transport failure, 429 or 5xx.
    Transient(String),
    Rejected(String),
}

impl SendError {
    fn is_transient(&self) -> bool {
        matches!(self, SendError::Transient(_))
    }
}

/// Delivers messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    api_base_url: String,
    bot_token: String,
    retry_attempts: usize,
    retry_delay_ms: u64,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, bot_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms.max(1),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token, method)
    }

    async fn send_once(&self, chat_id: &str, text: &str) -> std::result::Result<Option<String>, SendError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Transient(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(SendError::Transient(format!("Telegram returned HTTP {}", status)));
        }

        let body: TelegramResponse = response
            .json()
            .await
            .map_err(|e| {
                SendError::Rejected(format!("unreadable Telegram response: {}", e.without_url()))
            })?;

        if !body.ok {
            return Err(SendError::Rejected(
                body.description.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }

        Ok(body
            .result
            .and_then(|r| r.get("message_id").cloned())
            .map(|id| id.to_string()))
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, watcher_id: &str, message: &str) -> Result<NotificationResult> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.retry_delay_ms)
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.retry_attempts);

        let outcome = RetryIf::start(
            strategy,
            || self.send_once(watcher_id, message),
            |e: &SendError| {
                if e.is_transient() {
                    tracing::debug!(watcher_id, error = ?e, "Retrying Telegram delivery");
                }
                e.is_transient()
            },
        )
        .await;

        match outcome {
            Ok(message_id) => Ok(NotificationResult::delivered(message_id)),
            Err(SendError::Rejected(reason)) => Ok(NotificationResult::failed(reason)),
            Err(SendError::Transient(reason)) => Err(AppError::Notification(format!(
                "Telegram delivery to {} failed after retries: {}",
                watcher_id, reason
            ))),
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        // The request URL carries the bot token; keep it out of error text.
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let body: TelegramResponse = response.json().await.map_err(reqwest::Error::without_url)?;
        Ok(body.ok)
    }
}
