//! POST /ingestion

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::ingestion::IngestionReport;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    /// Raw wine list, one entry per line
    pub text: String,
    #[serde(default)]
    pub restaurant_id: Option<String>,
}

/// POST /ingestion
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestionRequest>,
) -> ApiResult<Json<IngestionReport>> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    let restaurant_id = request
        .restaurant_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let report = state
        .services
        .ingestion
        .ingest_list(&request.text, restaurant_id)
        .await?;

    Ok(Json(report))
}

pub fn ingestion_routes() -> Router<AppState> {
    Router::new().route("/ingestion", post(ingest))
}
