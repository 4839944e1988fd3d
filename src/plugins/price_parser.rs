use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

// First number in the text, thousands separators included. Currency markers
// (`₹`, `Rs.`, `INR`, ...) never contain digits so they fall outside the match.
static PRICE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid price pattern"));

/// Reduces scraped price text such as `₹1,299`, `Rs. 45,999.00` or `1,299.` to a
/// plain decimal string. Only the first price is kept when several are listed.
pub fn normalize_price_text(text: &str) -> Option<String> {
    let token = PRICE_TOKEN.find(text)?;
    let digits: String = token.as_str().chars().filter(|c| *c != ',').collect();
    Some(digits)
}

pub fn parse_price(text: &str) -> Option<Decimal> {
    let normalized = normalize_price_text(text)?;
    Decimal::from_str(&normalized).ok()
}
