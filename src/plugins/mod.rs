pub mod extractors;
pub mod manager;
pub mod notifiers;
pub mod price_parser;
pub mod traits;

pub use manager::PluginManager;
pub use traits::{ExtractorPlugin, NotifierPlugin};
