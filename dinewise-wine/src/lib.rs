//! dinewise-wine library interface
//!
//! Wine intelligence for Dinewise: wine-list ingestion, researched
//! enrichment under a daily budget, and guest recommendations.

pub mod api;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod ingestion;
pub mod models;
pub mod providers;
pub mod recommendation;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::services::Services;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub services: Arc<Services>,
    /// Cancellation tokens for active enrichment runs
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Parent of every run token; cancelled on shutdown
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, services: Services) -> Self {
        Self {
            db,
            services: Arc::new(services),
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::recommendation_routes())
        .merge(api::enrichment_routes())
        .merge(api::ingestion_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
