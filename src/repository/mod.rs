use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{NewProduct, Product, Subscription};
use crate::utils::Result;

pub mod sqlite;

pub use sqlite::SqliteRepository;

/// Storage for tracked products and the watchers subscribed to them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Every tracked product, least recently updated first.
    async fn find_tracked_products(&self) -> Result<Vec<Product>>;

    async fn find_product(&self, product_id: &str) -> Result<Option<Product>>;

    /// Atomically records `new_price` as the current price, shifting the old one to
    /// `previous_price` and widening the bounds. `None` when the product is unknown
    /// or the price did not move.
    async fn update_price(&self, product_id: &str, new_price: Decimal) -> Result<Option<Product>>;

    async fn find_subscriptions_by_product(&self, product_id: &str) -> Result<Vec<Subscription>>;

    async fn find_subscriptions_by_watcher(&self, watcher_id: &str) -> Result<Vec<Subscription>>;

    /// Returns the product already stored under the same name, otherwise inserts one.
    async fn find_or_create_product(&self, product: NewProduct) -> Result<Product>;

    async fn find_or_create_subscription(&self, watcher_id: &str, product_id: &str) -> Result<Subscription>;

    /// Deletes the subscription only if `watcher_id` owns it.
    async fn delete_subscription(&self, subscription_id: &str, watcher_id: &str) -> Result<bool>;
}
