use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{query, query_as, FromRow, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::PriceRepository;
use crate::config::DatabaseConfig;
use crate::models::{NewProduct, Product, Subscription};
use crate::utils::Result;

/// On-disk path named by a SQLite connection URL; `None` for in-memory databases.
fn database_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

const PRODUCT_COLUMNS: &str = "id, name, url, price, previous_price, lower, upper, updated_at";

#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the pool described by `config` and brings the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = database_file(&config.url).as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout))
            .connect(&config.url)
            .await?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>> {
        let product = query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE name = ?",
            PRODUCT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> sqlx::Result<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

impl<'r> FromRow<'r, SqliteRow> for Product {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            price: decimal_column(row, "price")?,
            previous_price: decimal_column(row, "previous_price")?,
            lower: decimal_column(row, "lower")?,
            upper: decimal_column(row, "upper")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl PriceRepository for SqliteRepository {
    async fn find_tracked_products(&self) -> Result<Vec<Product>> {
        let products = query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY updated_at ASC, name ASC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn find_product(&self, product_id: &str) -> Result<Option<Product>> {
        let product = query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update_price(&self, product_id: &str, new_price: Decimal) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let current = query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut product) = current else {
            return Ok(None);
        };

        if !product.apply_price(new_price, Utc::now()) {
            return Ok(None);
        }

        query(
            "UPDATE products SET price = ?, previous_price = ?, lower = ?, upper = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(product.price.to_string())
        .bind(product.previous_price.to_string())
        .bind(product.lower.to_string())
        .bind(product.upper.to_string())
        .bind(product.updated_at)
        .bind(&product.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            product_id,
            previous = %product.previous_price,
            current = %product.price,
            "Stored price change"
        );
        Ok(Some(product))
    }

    async fn find_subscriptions_by_product(&self, product_id: &str) -> Result<Vec<Subscription>> {
        let subscriptions = query_as::<_, Subscription>(
            "SELECT id, watcher_id, product_id, created_at FROM subscriptions \
             WHERE product_id = ? ORDER BY created_at ASC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn find_subscriptions_by_watcher(&self, watcher_id: &str) -> Result<Vec<Subscription>> {
        let subscriptions = query_as::<_, Subscription>(
            "SELECT id, watcher_id, product_id, created_at FROM subscriptions \
             WHERE watcher_id = ? ORDER BY created_at ASC",
        )
        .bind(watcher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn find_or_create_product(&self, new_product: NewProduct) -> Result<Product> {
        if let Some(existing) = self.find_product_by_name(&new_product.name).await? {
            return Ok(existing);
        }

        let product = Product::new(new_product);
        // A concurrent insert of the same name loses quietly and we return the winner.
        query(
            "INSERT INTO products (id, name, url, price, previous_price, lower, upper, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.url)
        .bind(product.price.to_string())
        .bind(product.previous_price.to_string())
        .bind(product.lower.to_string())
        .bind(product.upper.to_string())
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        let stored = self.find_product_by_name(&product.name).await?;
        Ok(stored.unwrap_or(product))
    }

    async fn find_or_create_subscription(&self, watcher_id: &str, product_id: &str) -> Result<Subscription> {
        let subscription = Subscription::new(watcher_id, product_id);

        query(
            "INSERT INTO subscriptions (id, watcher_id, product_id, created_at) \
             VALUES (?, ?, ?, ?) ON CONFLICT (watcher_id, product_id) DO NOTHING",
        )
        .bind(&subscription.id)
        .bind(&subscription.watcher_id)
        .bind(&subscription.product_id)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await?;

        let stored = query_as::<_, Subscription>(
            "SELECT id, watcher_id, product_id, created_at FROM subscriptions \
             WHERE watcher_id = ? AND product_id = ?",
        )
        .bind(watcher_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn delete_subscription(&self, subscription_id: &str, watcher_id: &str) -> Result<bool> {
        let rows_affected = query("DELETE FROM subscriptions WHERE id = ? AND watcher_id = ?")
            .bind(subscription_id)
            .bind(watcher_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
