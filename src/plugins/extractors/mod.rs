pub mod amazon;
pub mod flipkart;
pub mod generic;
pub mod rules;

pub use amazon::AmazonExtractor;
pub use flipkart::FlipkartExtractor;
pub use generic::{GenericExtractor, LookupService, PriceHistoryLookup};
pub use rules::{CssRule, ExtractionRule, LabeledRowRule, RuleChain};
