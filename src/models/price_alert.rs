use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use crate::models::Product;

/// Snapshot of one observed price change, ready to be rendered for a watcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceAlert {
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub previous_price: Decimal,
    pub current_price: Decimal,
    /// `None` when the previous price was zero.
    pub percent_change: Option<Decimal>,
}

impl PriceAlert {
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            url: product.url.clone(),
            previous_price: product.previous_price,
            current_price: product.price,
            percent_change: percent_change(product.previous_price, product.price),
        }
    }

    pub fn render(&self, currency_symbol: &str) -> String {
        let pct = match self.percent_change {
            Some(pct) => format!("{:.2}%", pct),
            None => "n/a".to_string(),
        };

        format!(
            "🎉 Good news! The price of {} has changed.\n   - Previous Price: {}{:.2}\n   - Current Price: {}{:.2}\n   - Percentage Change: {}\n   - Check it out here: {}",
            self.name,
            currency_symbol,
            self.previous_price,
            currency_symbol,
            self.current_price,
            pct,
            self.url,
        )
    }
}

/// `(current - previous) / previous * 100`, rounded half away from zero to 2 dp.
/// `None` when the previous price is zero or the ratio does not fit a `Decimal`.
pub fn percent_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }

    let pct = current
        .checked_sub(previous)?
        .checked_div(previous)?
        .checked_mul(Decimal::ONE_HUNDRED)?;
    Some(pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
