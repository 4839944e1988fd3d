use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::models::Platform;
use crate::utils::Result;

/// Raw page body as returned by a strategy's fetch. Parsing happens on demand since
/// `scraper::Html` cannot be held across an await point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Stand-in document used when a lookup yields nothing to fetch.
    pub fn empty(url: impl Into<String>) -> Self {
        Self::new(url, "")
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Outcome of running one strategy (or the coordinator) against a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub title: Option<String>,
    pub price: Option<Decimal>,
}

impl Extraction {
    pub fn new(title: Option<String>, price: Option<Decimal>) -> Self {
        let title = title.filter(|t| !t.trim().is_empty());
        Self { title, price }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.price.is_some()
    }
}

/// One storefront's way of fetching a product page and reading its title and price.
#[async_trait]
pub trait ExtractorPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn platform(&self) -> Platform;

    async fn fetch(&self, url: &str) -> Result<FetchedPage>;

    /// Empty string when no title could be located.
    fn title(&self, doc: &Html) -> String;
    fn price(&self, doc: &Html) -> Option<Decimal>;

    /// Parses the page once and reads both fields from it.
    fn read(&self, page: &FetchedPage) -> Extraction {
        let doc = page.document();
        Extraction::new(Some(self.title(&doc)), self.price(&doc))
    }
}
