//! Enrichment API handlers
//!
//! POST /enrichment/run, POST /enrichment/cancel, POST /enrichment/wines/{id},
//! GET /enrichment/budget, GET /enrichment/status

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::wines;
use crate::enrichment::{BatchStats, BudgetSnapshot, EnrichmentError, EnrichmentErrorKind};
use crate::error::{ApiError, ApiResult};
use crate::models::{EnrichmentStatus, WineRecord};
use crate::services::EnrichmentServices;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RunBatchRequest {
    pub limit: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub cancelled_runs: Vec<Uuid>,
}

/// Outcome of enriching a single wine
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichWineResponse {
    pub wine_id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EnrichmentErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wine: Option<WineRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentStatusResponse {
    pub wines_by_status: BTreeMap<String, i64>,
    pub active_runs: usize,
    pub budget: BudgetSnapshot,
}

fn enrichment_services(state: &AppState) -> ApiResult<&EnrichmentServices> {
    state
        .services
        .enrichment
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("No research provider configured".to_string()))
}

/// POST /enrichment/run
///
/// Runs one batch in a background task and returns its statistics when it
/// finishes. The run outlives the request: a client that disconnects does
/// not interrupt it, and it can be stopped between items through
/// POST /enrichment/cancel.
pub async fn run_batch(
    State(state): State<AppState>,
    Json(request): Json<RunBatchRequest>,
) -> ApiResult<Json<BatchStats>> {
    let batch = enrichment_services(&state)?.batch.clone();
    let max = state.services.max_batch_limit;
    if request.limit == 0 || request.limit > max {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}, got {}",
            max, request.limit
        )));
    }

    let run_id = Uuid::new_v4();
    let cancel_token = state.shutdown.child_token();
    state
        .cancellation_tokens
        .write()
        .await
        .insert(run_id, cancel_token.clone());

    let limit = request.limit;
    let tokens = state.cancellation_tokens.clone();
    let last_error = state.last_error.clone();
    let handle = tokio::spawn(async move {
        tracing::info!(run_id = %run_id, "Background enrichment task started");

        let result = batch.run_batch(run_id, limit, &cancel_token).await;
        tokens.write().await.remove(&run_id);

        if let Err(e) = &result {
            tracing::error!(run_id = %run_id, error = %e, "Enrichment batch failed");
            *last_error.write().await = Some(format!("enrichment batch {}: {}", run_id, e));
        }
        result
    });

    match handle.await {
        Ok(Ok(stats)) => Ok(Json(stats)),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => {
            state.cancellation_tokens.write().await.remove(&run_id);
            *state.last_error.write().await = Some(format!("enrichment batch {} aborted: {}", run_id, e));
            Err(ApiError::Internal(format!("Enrichment task failed: {}", e)))
        }
    }
}

/// POST /enrichment/cancel
///
/// Signals every active run; each stops before its next wine.
pub async fn cancel_runs(State(state): State<AppState>) -> Json<CancelResponse> {
    let tokens = state.cancellation_tokens.read().await;
    let cancelled_runs: Vec<Uuid> = tokens
        .iter()
        .map(|(run_id, token)| {
            token.cancel();
            *run_id
        })
        .collect();

    tracing::info!(runs = cancelled_runs.len(), "Enrichment runs cancelled");
    Json(CancelResponse { cancelled_runs })
}

/// POST /enrichment/wines/{id}
///
/// Explicit re-enrichment of one wine, verified or not.
pub async fn enrich_wine(
    State(state): State<AppState>,
    Path(wine_id): Path<Uuid>,
) -> ApiResult<Json<EnrichWineResponse>> {
    let enrichment = enrichment_services(&state)?;
    let wine = wines::load_wine(&state.db, wine_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Wine not found: {}", wine_id)))?;

    let response = match enrichment.orchestrator.enrich(&wine).await {
        Ok(record) => EnrichWineResponse {
            wine_id,
            ok: true,
            reason: None,
            message: None,
            wine: Some(record),
        },
        Err(EnrichmentError::StorageWrite(e)) => return Err(e.into()),
        Err(e) => EnrichWineResponse {
            wine_id,
            ok: false,
            reason: Some(e.kind()),
            message: Some(e.to_string()),
            wine: wines::load_wine(&state.db, wine_id).await?,
        },
    };

    Ok(Json(response))
}

/// GET /enrichment/budget
pub async fn budget(State(state): State<AppState>) -> Json<BudgetSnapshot> {
    Json(state.services.budget.snapshot())
}

/// GET /enrichment/status
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<EnrichmentStatusResponse>> {
    let mut wines_by_status: BTreeMap<String, i64> = [
        EnrichmentStatus::Unverified,
        EnrichmentStatus::Pending,
        EnrichmentStatus::Verified,
        EnrichmentStatus::Failed,
    ]
    .iter()
    .map(|s| (s.to_string(), 0))
    .collect();

    for (status, count) in wines::count_by_status(&state.db).await? {
        wines_by_status.insert(status.to_string(), count);
    }

    Ok(Json(EnrichmentStatusResponse {
        wines_by_status,
        active_runs: state.cancellation_tokens.read().await.len(),
        budget: state.services.budget.snapshot(),
    }))
}

pub fn enrichment_routes() -> Router<AppState> {
    Router::new()
        .route("/enrichment/run", post(run_batch))
        .route("/enrichment/cancel", post(cancel_runs))
        .route("/enrichment/wines/:id", post(enrich_wine))
        .route("/enrichment/budget", get(budget))
        .route("/enrichment/status", get(status))
}
