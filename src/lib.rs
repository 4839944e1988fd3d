pub mod config;
pub mod coordinator;
pub mod models;
pub mod notifications;
pub mod platform;
pub mod plugins;
pub mod price_check;
pub mod product_manager;
pub mod repository;
pub mod scheduler;
pub mod scraper;
pub mod telemetry;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::{AppError, Result};
