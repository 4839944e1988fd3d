use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, COOKIE, USER_AGENT};
use reqwest::{redirect, Client};
use std::time::{Duration, Instant};

use crate::plugins::traits::FetchedPage;
use crate::utils::{AppError, Result};

pub const FIREFOX_DESKTOP_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:112.0) Gecko/20100101 Firefox/112.0";
pub const CHROME_LINUX_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Request headers a storefront expects before it serves a real product page.
#[derive(Debug, Clone)]
pub struct FetchProfile {
    pub user_agent: &'static str,
    pub headers: Vec<(HeaderName, &'static str)>,
}

impl FetchProfile {
    pub fn amazon() -> Self {
        Self {
            user_agent: FIREFOX_DESKTOP_UA,
            headers: vec![(COOKIE, "cookies_are=working")],
        }
    }

    pub fn flipkart() -> Self {
        Self {
            user_agent: FIREFOX_DESKTOP_UA,
            headers: vec![(ACCEPT_LANGUAGE, "en-IN;q=0.9,en;q=0.8")],
        }
    }

    pub fn generic() -> Self {
        Self {
            user_agent: CHROME_LINUX_UA,
            headers: Vec::new(),
        }
    }

    fn header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent));
        for (name, value) in &self.headers {
            headers.insert(name.clone(), HeaderValue::from_static(value));
        }
        headers
    }
}

/// Plain HTTP page fetcher: one GET per call, redirects followed, whole request
/// bounded by `timeout`. No retries.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(profile: FetchProfile, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .default_headers(profile.header_map())
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// The configured client, shared with callers that need more than a GET
    /// (the lookup service posts a search form through it).
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get(&self, url: &str) -> Result<FetchedPage> {
        let start_time = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        // After redirects
        let final_url = response.url().to_string();

        if !status.is_success() {
            tracing::debug!(url, %status, "Page fetch returned non-success status");
            return Err(AppError::Scraping(format!("{} returned HTTP {}", url, status)));
        }

        let html = response.text().await?;
        tracing::debug!(
            url,
            final_url = %final_url,
            bytes = html.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Fetched page"
        );

        Ok(FetchedPage::new(final_url, html))
    }
}
