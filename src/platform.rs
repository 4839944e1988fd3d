use regex::Regex;
use std::sync::LazyLock;

use crate::models::Platform;

// Ordered: the first platform with a matching pattern wins.
static PLATFORM_PATTERNS: LazyLock<Vec<(Platform, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("valid platform pattern"))
            .collect::<Vec<_>>()
    };

    vec![
        (
            Platform::Amazon,
            compile(&[
                r"(?i)^https?://([\w-]+\.)*amazon\.[a-z]{2,3}(\.[a-z]{2})?(/|\?|$)",
                r"(?i)^https?://(www\.)?amzn\.(to|in|eu)(/|\?|$)",
                r"(?i)^https?://(www\.)?a\.co(/|\?|$)",
            ]),
        ),
        (
            Platform::Flipkart,
            compile(&[
                r"(?i)^https?://((www|dl)\.)?flipkart\.com(/|\?|$)",
                r"(?i)^https?://(www\.)?fkrt\.it(/|\?|$)",
            ]),
        ),
    ]
});

/// Maps a product URL to the storefront strategy that should handle it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformClassifier;

impl PlatformClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Unrecognised URLs fall into the Flipkart bucket; the coordinator's generic
    /// fallback picks them up when the Flipkart selectors find nothing.
    pub fn classify(&self, url: &str) -> Platform {
        self.recognise(url).unwrap_or(Platform::Flipkart)
    }

    pub fn recognise(&self, url: &str) -> Option<Platform> {
        let url = url.trim();
        PLATFORM_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(url)))
            .map(|(platform, _)| *platform)
    }
}
