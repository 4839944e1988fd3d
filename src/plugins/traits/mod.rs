pub mod extractor;
pub mod notifier;

pub use extractor::{ExtractorPlugin, Extraction, FetchedPage};
pub use notifier::{NotifierPlugin, NotificationResult};

#[cfg(test)]
pub use notifier::MockNotifierPlugin;
