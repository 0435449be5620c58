//! HTTP API handlers for dinewise-wine

pub mod enrichment;
pub mod health;
pub mod ingestion;
pub mod recommendations;

pub use enrichment::enrichment_routes;
pub use health::health_routes;
pub use ingestion::ingestion_routes;
pub use recommendations::recommendation_routes;
