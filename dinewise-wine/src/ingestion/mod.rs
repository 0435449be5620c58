//! Wine-list ingestion: classification and deduplicated insertion

pub mod classifier;
pub mod llm;
pub mod parser;
pub mod pattern;

pub use classifier::{ClassifierError, StructuredWine, WineClassifier};
pub use llm::LlmClassifier;
pub use parser::{IngestionError, IngestionParser, IngestionReport, ParsedWine};
pub use pattern::PatternClassifier;
