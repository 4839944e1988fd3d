use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use std::sync::LazyLock;
use std::time::Duration;

use super::rules::RuleChain;
use crate::models::Platform;
use crate::plugins::price_parser::parse_price;
use crate::plugins::traits::{ExtractorPlugin, FetchedPage};
use crate::scraper::{FetchProfile, PageFetcher};
use crate::utils::Result;

static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" {3,}").expect("valid whitespace pattern"));

const TITLE: &str = "h1 > span";

// Positional paths into the product layout, newest layout first.
const PRICE_CANDIDATES: [&str; 3] = [
    "#container>div>div:nth-child(3)>div:nth-child(1)>div:nth-child(2)>div:nth-child(2)>div>div:nth-child(3)>div:nth-child(1)>div>div:nth-child(1)",
    "#container>div>div:nth-child(3)>div:nth-child(1)>div:nth-child(2)>div:nth-child(2)>div>div:nth-child(4)>div>div>div:nth-child(1)",
    "div.Nx9bqj",
];

pub struct FlipkartExtractor {
    fetcher: PageFetcher,
    title_rules: RuleChain,
    price_rules: RuleChain,
}

impl FlipkartExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let price_rules = PRICE_CANDIDATES
            .iter()
            .try_fold(RuleChain::new(), |chain, css| chain.css(css))?;

        Ok(Self {
            fetcher: PageFetcher::new(FetchProfile::flipkart(), timeout)?,
            title_rules: RuleChain::new().css(TITLE)?,
            price_rules,
        })
    }
}

#[async_trait]
impl ExtractorPlugin for FlipkartExtractor {
    fn name(&self) -> &str {
        "Flipkart Extractor"
    }

    fn platform(&self) -> Platform {
        Platform::Flipkart
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.fetcher.get(url).await
    }

    fn title(&self, doc: &Html) -> String {
        self.title_rules
            .evaluate(doc)
            .map(|title| SPACE_RUNS.replace_all(&title, " ").trim().to_string())
            .unwrap_or_default()
    }

    fn price(&self, doc: &Html) -> Option<Decimal> {
        self.price_rules.evaluate(doc).and_then(|text| parse_price(&text))
    }
}
