use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::models::{generate_id, Subscription};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    /// Canonical title as scraped; products are deduplicated on it.
    pub name: String,
    pub url: String,

    // Price history
    pub price: Decimal,
    pub previous_price: Decimal,
    pub lower: Decimal,
    pub upper: Decimal,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub url: String,
    pub price: Decimal,
}

impl Product {
    pub fn new(new_product: NewProduct) -> Self {
        let price = new_product.price;
        Self {
            id: generate_id(),
            name: new_product.name,
            url: new_product.url,
            price,
            previous_price: price,
            lower: price,
            upper: price,
            updated_at: Utc::now(),
        }
    }

    /// Records a newly observed price. Returns false, leaving the product untouched,
    /// when the price has not moved.
    pub fn apply_price(&mut self, new_price: Decimal, now: DateTime<Utc>) -> bool {
        if new_price == self.price {
            return false;
        }

        self.previous_price = self.price;
        self.price = new_price;
        self.lower = self.lower.min(new_price);
        self.upper = self.upper.max(new_price);
        self.updated_at = now;
        true
    }

    pub fn within_bounds(&self) -> bool {
        self.lower <= self.price && self.price <= self.upper
    }
}

/// A watcher's subscription joined with the product it points at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tracking {
    pub subscription: Subscription,
    pub product: Product,
}
