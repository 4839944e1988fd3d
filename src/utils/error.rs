use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Plugin error: {plugin_type}: {message}")]
    Plugin { plugin_type: String, message: String },

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Lookup service error: {0}")]
    Lookup(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
