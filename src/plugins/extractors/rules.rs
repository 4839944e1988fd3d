use scraper::{ElementRef, Html, Selector};

use crate::utils::{AppError, Result};

/// A single way of locating a piece of text in a product page.
pub trait ExtractionRule: Send + Sync {
    fn describe(&self) -> String;

    /// Trimmed text of the located node, `None` when missing or blank.
    fn apply(&self, doc: &Html) -> Option<String>;
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Parse {
        message: format!("invalid selector '{}': {}", css, e),
    })
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Text of the first element matching a CSS selector.
pub struct CssRule {
    css: String,
    selector: Selector,
}

impl CssRule {
    pub fn new(css: &str) -> Result<Self> {
        Ok(Self {
            css: css.to_string(),
            selector: parse_selector(css)?,
        })
    }
}

impl ExtractionRule for CssRule {
    fn describe(&self) -> String {
        format!("css({})", self.css)
    }

    fn apply(&self, doc: &Html) -> Option<String> {
        doc.select(&self.selector).next().and_then(element_text)
    }
}

/// Value cell of the first table row whose text mentions `label`, as laid out by
/// the price history lookup pages (`<tr><th>Price</th><td>₹1,299</td></tr>`).
pub struct LabeledRowRule {
    table_css: String,
    label: String,
    rows: Selector,
    value_cell: Selector,
}

impl LabeledRowRule {
    pub fn new(table_css: &str, label: &str) -> Result<Self> {
        Ok(Self {
            table_css: table_css.to_string(),
            label: label.to_string(),
            rows: parse_selector(&format!("{} tr", table_css))?,
            value_cell: parse_selector("td")?,
        })
    }
}

impl ExtractionRule for LabeledRowRule {
    fn describe(&self) -> String {
        format!("row({} / {})", self.table_css, self.label)
    }

    fn apply(&self, doc: &Html) -> Option<String> {
        doc.select(&self.rows)
            .filter(|row| row.text().collect::<String>().contains(&self.label))
            .find_map(|row| row.select(&self.value_cell).next().and_then(element_text))
    }
}

/// Ordered candidate rules; the first one producing text wins.
#[derive(Default)]
pub struct RuleChain {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rule: impl ExtractionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn css(self, css: &str) -> Result<Self> {
        Ok(self.with(CssRule::new(css)?))
    }

    pub fn labeled_row(self, table_css: &str, label: &str) -> Result<Self> {
        Ok(self.with(LabeledRowRule::new(table_css, label)?))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, doc: &Html) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let text = rule.apply(doc);
            if text.is_some() {
                tracing::trace!(rule = %rule.describe(), "Extraction rule matched");
            }
            text
        })
    }
}
