use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret expected in `X-Trigger-Token` on trigger endpoints.
    pub trigger_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Seconds allowed for a platform strategy fetch.
    pub request_timeout: u64,
    /// Seconds allowed for the generic fallback (lookup + page fetch).
    pub fallback_timeout: u64,
    pub inter_request_delay_ms: u64,
    pub lookup_base_url: String,
}

impl ScraperConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout)
    }

    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub currency_symbol: String,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_base_url: String,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl AppConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = Config::builder()
            .add_source(File::with_name(&path("default")))
            .add_source(File::with_name(&path(&run_mode)).required(false))
            // Local overrides, ignored by git
            .add_source(File::with_name(&path("local")).required(false))
            .add_source(Environment::with_prefix("SENTINEL").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.notifications.telegram.bot_token.is_none() {
            config.notifications.telegram.bot_token = env::var("TELEGRAM_BOT_TOKEN").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("Database max_connections must be greater than 0".into()));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message("Database min_connections cannot exceed max_connections".into()));
        }

        if self.scraper.request_timeout == 0 || self.scraper.fallback_timeout == 0 {
            return Err(ConfigError::Message("Scraper timeouts must be greater than 0".into()));
        }

        if Url::parse(&self.scraper.lookup_base_url).is_err() {
            return Err(ConfigError::Message("Invalid lookup_base_url format".into()));
        }

        if !is_valid_cron(&self.scheduler.cron) {
            return Err(ConfigError::Message("Invalid cron expression in scheduler.cron".into()));
        }

        if Url::parse(&self.notifications.telegram.api_base_url).is_err() {
            return Err(ConfigError::Message("Invalid telegram api_base_url format".into()));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }
}

/// Cron expressions as accepted by tokio-cron-scheduler: six fields (seconds first),
/// optionally a seventh year field.
pub fn is_valid_cron(cron_expr: &str) -> bool {
    let parts: Vec<&str> = cron_expr.split_whitespace().collect();
    if parts.len() != 6 && parts.len() != 7 {
        return false;
    }

    parts.iter().all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | ',' | '/' | '?'))
    })
}
