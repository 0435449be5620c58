//! POST /recommendations

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::db::inventory;
use crate::error::{ApiError, ApiResult};
use crate::models::{GuestPreference, RecommendationResult};
use crate::recommendation::PreferenceParseError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub restaurant_id: String,
    #[serde(default)]
    pub guest_description: String,
    /// Pre-parsed preference; skips the preference parser when present
    #[serde(default)]
    pub preference: Option<GuestPreference>,
}

/// POST /recommendations
///
/// Only verified wines are scored. A short or empty list is a normal
/// answer for a thin inventory.
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> ApiResult<Json<RecommendationResult>> {
    let restaurant_id = request.restaurant_id.trim();
    if restaurant_id.is_empty() {
        return Err(ApiError::BadRequest("restaurantId is required".to_string()));
    }

    let preference = match request.preference {
        Some(preference) => preference,
        None => state
            .services
            .preference_parser
            .parse(&request.guest_description)
            .await
            .map_err(|e| match e {
                PreferenceParseError::Empty => ApiError::BadRequest(
                    "guestDescription or preference is required".to_string(),
                ),
                PreferenceParseError::Backend(msg) => ApiError::Internal(msg),
            })?,
    };

    let items = inventory::load_enriched_inventory(&state.db, restaurant_id).await?;
    tracing::debug!(
        restaurant_id = %restaurant_id,
        inventory = items.len(),
        preference = ?preference,
        "Recommendation request"
    );

    let result = state
        .services
        .recommendations
        .recommend(restaurant_id, &items, &preference)
        .await;

    Ok(Json(result))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new().route("/recommendations", post(recommend))
}
