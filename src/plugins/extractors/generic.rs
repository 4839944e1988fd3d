use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::Html;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::rules::RuleChain;
use crate::models::Platform;
use crate::plugins::price_parser::parse_price;
use crate::plugins::traits::{ExtractorPlugin, FetchedPage};
use crate::scraper::{FetchProfile, PageFetcher};
use crate::utils::{AppError, Result};

/// Resolves an arbitrary store URL to a page on a price-history aggregator that
/// renders the product in a predictable layout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupService: Send + Sync {
    /// URL of the aggregator page for `product_url`, or `None` when it has no entry.
    async fn resolve(&self, product_url: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    status: bool,
    #[serde(default)]
    code: String,
}

pub struct PriceHistoryLookup {
    client: Client,
    base_url: String,
}

impl PriceHistoryLookup {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LookupService for PriceHistoryLookup {
    async fn resolve(&self, product_url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/api/search", self.base_url))
            .form(&[("url", product_url)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Lookup(format!(
                "search returned HTTP {}",
                response.status()
            )));
        }

        let body: LookupResponse = response.json().await?;
        if !body.status || body.code.is_empty() {
            tracing::debug!(product_url, "Lookup service has no entry for URL");
            return Ok(None);
        }

        Ok(Some(format!("{}/p/{}", self.base_url, body.code)))
    }
}

pub struct GenericExtractor {
    lookup: Arc<dyn LookupService>,
    fetcher: PageFetcher,
    title_rules: RuleChain,
    price_rules: RuleChain,
}

impl GenericExtractor {
    pub fn new(lookup: Arc<dyn LookupService>, timeout: Duration) -> Result<Self> {
        let fetcher = PageFetcher::new(FetchProfile::generic(), timeout)?;
        Self::with_fetcher(lookup, fetcher)
    }

    /// Generic extractor backed by the price history lookup at `base_url`, sharing
    /// one client for the search and the page fetch.
    pub fn with_price_history(base_url: &str, timeout: Duration) -> Result<Self> {
        let fetcher = PageFetcher::new(FetchProfile::generic(), timeout)?;
        let lookup = Arc::new(PriceHistoryLookup::new(fetcher.client().clone(), base_url));
        Self::with_fetcher(lookup, fetcher)
    }

    fn with_fetcher(lookup: Arc<dyn LookupService>, fetcher: PageFetcher) -> Result<Self> {
        Ok(Self {
            lookup,
            fetcher,
            title_rules: RuleChain::new().labeled_row("div#product-info table", "Product Name")?,
            price_rules: RuleChain::new().labeled_row("div#price-table table", "Price")?,
        })
    }
}

#[async_trait]
impl ExtractorPlugin for GenericExtractor {
    fn name(&self) -> &str {
        "Generic Extractor"
    }

    fn platform(&self) -> Platform {
        Platform::Generic
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        match self.lookup.resolve(url).await? {
            Some(page_url) => self.fetcher.get(&page_url).await,
            None => Ok(FetchedPage::empty(url)),
        }
    }

    fn title(&self, doc: &Html) -> String {
        self.title_rules.evaluate(doc).unwrap_or_default()
    }

    fn price(&self, doc: &Html) -> Option<Decimal> {
        self.price_rules.evaluate(doc).and_then(|text| parse_price(&text))
    }
}
