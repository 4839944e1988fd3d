use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod price_alert;
pub mod product;
pub mod subscription;

pub use price_alert::*;
pub use product::*;
pub use subscription::*;

/// Storefront a product URL belongs to. Anything we cannot place lands in `Flipkart`,
/// the non-Amazon bucket; `Generic` is only ever used as the fallback strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Amazon,
    Flipkart,
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Helper function to generate UUIDs in the format expected by the database
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
