use async_trait::async_trait;
use rust_decimal::Decimal;
use scraper::Html;
use std::time::Duration;

use super::rules::RuleChain;
use crate::models::Platform;
use crate::plugins::price_parser::parse_price;
use crate::plugins::traits::{ExtractorPlugin, FetchedPage};
use crate::scraper::{FetchProfile, PageFetcher};
use crate::utils::Result;

const TITLE: &str = "div#titleSection > h1#title > span#productTitle";

const PRICE_CANDIDATES: [&str; 3] = [
    "span#priceblock_ourprice",
    "div#corePriceDisplay_desktop_feature_div span.a-price.aok-align-center.reinventPricePriceToPayMargin.priceToPay > span:nth-child(2) > span.a-price-whole",
    "div#corePrice_desktop table span.a-offscreen",
];

pub struct AmazonExtractor {
    fetcher: PageFetcher,
    title_rules: RuleChain,
    price_rules: RuleChain,
}

impl AmazonExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let price_rules = PRICE_CANDIDATES
            .iter()
            .try_fold(RuleChain::new(), |chain, css| chain.css(css))?;

        Ok(Self {
            fetcher: PageFetcher::new(FetchProfile::amazon(), timeout)?,
            title_rules: RuleChain::new().css(TITLE)?,
            price_rules,
        })
    }
}

#[async_trait]
impl ExtractorPlugin for AmazonExtractor {
    fn name(&self) -> &str {
        "Amazon Extractor"
    }

    fn platform(&self) -> Platform {
        Platform::Amazon
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.fetcher.get(url).await
    }

    fn title(&self, doc: &Html) -> String {
        self.title_rules.evaluate(doc).unwrap_or_default()
    }

    fn price(&self, doc: &Html) -> Option<Decimal> {
        self.price_rules.evaluate(doc).and_then(|text| parse_price(&text))
    }
}
