//! Wine recommendations for a guest at a restaurant

pub mod engine;
pub mod preference_parser;
pub mod scoring;
pub mod selection;

pub use engine::{RecommendationEngine, RecommendationLog, SqliteRecommendationLog};
pub use preference_parser::{KeywordPreferenceParser, PreferenceParseError, PreferenceParser};
pub use scoring::{Scorer, WineScore};
pub use selection::{select, Candidate, SelectionPolicy};
