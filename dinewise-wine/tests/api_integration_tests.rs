//! Integration tests for dinewise-wine API endpoints

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use dinewise_wine::db::{inventory, wines};
use dinewise_wine::models::EnrichmentStatus;
use dinewise_wine::providers::ResearchProvider;
use dinewise_wine::AppState;

use helpers::*;

async fn create_test_app(providers: Vec<Arc<dyn ResearchProvider>>) -> (Router, sqlx::SqlitePool) {
    let pool = create_test_db().await;
    let services = create_services(&pool, &test_config(100), providers);
    let state = AppState::new(pool.clone(), services);
    (dinewise_wine::build_router(state), pool)
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, body) = send(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dinewise-wine");
    assert_eq!(body["enrichment_enabled"], false);
}

#[tokio::test]
async fn test_enrichment_unavailable_without_provider() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, body) = send(app, "POST", "/enrichment/run", Some(json!({"limit": 5}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_enrichment_run_rejects_bad_limit() {
    let provider = ScriptedProvider::always("web", Step::Found(complete_research()));
    let (app, _pool) = create_test_app(vec![provider]).await;

    let (status, _) = send(app.clone(), "POST", "/enrichment/run", Some(json!({"limit": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, "POST", "/enrichment/run", Some(json!({"limit": 100000}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enrichment_run_returns_stats() {
    let provider = ScriptedProvider::always("web", Step::Found(complete_research()));
    let (app, pool) = create_test_app(vec![provider.clone()]).await;
    seed_wines(&pool, 2).await;

    let (status, body) = send(app.clone(), "POST", "/enrichment/run", Some(json!({"limit": 10}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["stopReason"], "completed");

    let (status, body) = send(app, "GET", "/enrichment/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winesByStatus"]["verified"], 2);
    assert_eq!(body["winesByStatus"]["unverified"], 0);
    assert_eq!(body["activeRuns"], 0);
    assert_eq!(body["budget"]["count"], 2);
    assert_eq!(body["budget"]["asOf"], "2026-03-14");
}

#[tokio::test]
async fn test_enrich_single_wine() {
    let provider = ScriptedProvider::always("web", Step::Fail);
    let (app, pool) = create_test_app(vec![provider]).await;
    let wine = seed_wines(&pool, 1).await.remove(0);

    let uri = format!("/enrichment/wines/{}", wine.id);
    let (status, body) = send(app.clone(), "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "max_retries_exceeded");
    assert_eq!(body["wine"]["status"], "failed");

    let missing = format!("/enrichment/wines/{}", uuid::Uuid::new_v4());
    let (status, body) = send(app, "POST", &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_budget_endpoint() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, body) = send(app, "GET", "/enrichment/budget", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ceiling"], 100);
    assert_eq!(body["remaining"], 100);
    assert!(body["asOf"].is_string());
}

#[tokio::test]
async fn test_cancel_with_no_active_runs() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, body) = send(app, "POST", "/enrichment/cancel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelledRuns"], json!([]));
}

#[tokio::test]
async fn test_ingestion_then_recommendation() {
    let (app, pool) = create_test_app(Vec::new()).await;

    let text = "2018 Ridge Monte Bello, Santa Cruz Mountains  $185\n\
                Cloudy Bay Sauvignon Blanc, Marlborough, New Zealand 2023 | 14 / 56\n";
    let (status, body) = send(
        app.clone(),
        "POST",
        "/ingestion",
        Some(json!({"text": text, "restaurantId": "bistro"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parsed"], 2);
    assert_eq!(body["linked"], 2);

    let request = json!({
        "restaurantId": "bistro",
        "preference": {"color": "white"}
    });

    // Freshly ingested wines are not researched yet
    let (status, body) = send(app.clone(), "POST", "/recommendations", Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], json!([]));

    let mut sauvignon = inventory::load_inventory(&pool, "bistro")
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.wine)
        .find(|wine| wine.identity.name == "Sauvignon Blanc")
        .unwrap();
    sauvignon.status = EnrichmentStatus::Verified;
    wines::save_enrichment(&pool, &sauvignon).await.unwrap();

    let (status, body) = send(app, "POST", "/recommendations", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restaurantId"], "bistro");
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "Sauvignon Blanc");
}

#[tokio::test]
async fn test_enrichment_run_survives_client_disconnect() {
    let pool = create_test_db().await;
    let mut config = test_config(100);
    config.enrichment.item_timeout_secs = 1;
    let provider = ScriptedProvider::always("web", Step::Hang);
    let services = create_services(&pool, &config, vec![provider.clone()]);
    let app = dinewise_wine::build_router(AppState::new(pool.clone(), services));
    seed_wines(&pool, 1).await;

    // The client gives up long before the hung lookup times out
    let dropped = tokio::time::timeout(
        Duration::from_millis(200),
        send(app.clone(), "POST", "/enrichment/run", Some(json!({"limit": 1}))),
    )
    .await;
    assert!(dropped.is_err());

    let (_, body) = send(app.clone(), "GET", "/enrichment/status", None).await;
    assert_eq!(body["activeRuns"], 1);

    // The run keeps going in the background and deregisters itself
    let mut active_runs = Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let (_, body) = send(app.clone(), "GET", "/enrichment/status", None).await;
        active_runs = body["activeRuns"].clone();
        if active_runs == 0 {
            break;
        }
    }
    assert_eq!(active_runs, 0);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_ingestion_rejects_empty_text() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, body) = send(app, "POST", "/ingestion", Some(json!({"text": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_recommendation_requires_description_or_preference() {
    let (app, _pool) = create_test_app(Vec::new()).await;

    let (status, _) = send(
        app.clone(),
        "POST",
        "/recommendations",
        Some(json!({"restaurantId": "bistro", "guestDescription": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app,
        "POST",
        "/recommendations",
        Some(json!({
            "restaurantId": "bistro",
            "guestDescription": "a bold red with firm tannins"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], json!([]));
}
