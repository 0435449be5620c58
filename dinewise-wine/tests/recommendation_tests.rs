//! Recommendation integration tests over a stored restaurant inventory

mod helpers;

use dinewise_wine::db::{inventory, recommendation_log, wines};
use dinewise_wine::models::{Band, EnrichmentStatus, GuestPreference, MatchType, WineIdentity, WineRecord};
use sqlx::SqlitePool;

use helpers::*;

async fn stock(
    pool: &SqlitePool,
    restaurant_id: &str,
    name: &str,
    wine_type: &str,
    tannin: f64,
    price: f64,
) -> WineRecord {
    let (mut wine, _) = wines::insert_if_absent(pool, &WineRecord::new(WineIdentity::new(name)))
        .await
        .unwrap();
    wine.characteristics.wine_type = Some(wine_type.to_string());
    wine.characteristics.tannin = Some(tannin);
    wine.status = EnrichmentStatus::Verified;
    wines::save_enrichment(pool, &wine).await.unwrap();
    inventory::link_to_restaurant(pool, restaurant_id, wine.id, Some(price))
        .await
        .unwrap();
    wine
}

#[tokio::test]
async fn test_high_tannin_cabernet_beats_unrelated_sauvignon_blanc() {
    let pool = create_test_db().await;
    let services = create_services(&pool, &test_config(100), Vec::new());
    let cabernet = stock(&pool, "bistro", "Napa Cabernet Sauvignon", "red", 4.5, 120.0).await;
    let sauvignon = stock(&pool, "bistro", "Loire Sauvignon Blanc", "white", 1.0, 55.0).await;

    let preference = GuestPreference {
        color: Some("red".to_string()),
        tannin: Band::from_label("medium-high"),
        ..Default::default()
    };
    let items = inventory::load_enriched_inventory(&pool, "bistro").await.unwrap();
    let result = services
        .recommendations
        .recommend("bistro", &items, &preference)
        .await;

    assert_eq!(result.matches[0].wine_id, cabernet.id);
    assert!(result.matches[0].score >= 0.5);
    assert!(!result
        .matches
        .iter()
        .any(|m| m.wine_id == sauvignon.id && m.match_type == MatchType::Perfect));
    assert_eq!(result.matches[0].price, Some(120.0));
}

#[tokio::test]
async fn test_recommendation_is_logged() {
    let pool = create_test_db().await;
    let services = create_services(&pool, &test_config(100), Vec::new());
    stock(&pool, "bistro", "Barolo", "red", 5.0, 150.0).await;

    let preference = GuestPreference {
        color: Some("red".to_string()),
        ..Default::default()
    };
    let items = inventory::load_enriched_inventory(&pool, "bistro").await.unwrap();
    services.recommendations.recommend("bistro", &items, &preference).await;
    services.recommendations.recommend("bistro", &items, &preference).await;

    assert_eq!(recommendation_log::count_for_restaurant(&pool, "bistro").await.unwrap(), 2);
    assert_eq!(recommendation_log::count_for_restaurant(&pool, "other").await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_inventory_gives_empty_list() {
    let pool = create_test_db().await;
    let services = create_services(&pool, &test_config(100), Vec::new());
    let preference = GuestPreference {
        color: Some("white".to_string()),
        ..Default::default()
    };

    let result = services.recommendations.recommend("nowhere", &[], &preference).await;
    assert!(result.matches.is_empty());
    assert_eq!(result.restaurant_id, "nowhere");
}

#[tokio::test]
async fn test_unresearched_wine_is_not_recommended() {
    let pool = create_test_db().await;
    let services = create_services(&pool, &test_config(100), Vec::new());
    let verified = stock(&pool, "bistro", "Chablis", "white", 1.0, 70.0).await;

    let (mut pending, _) = wines::insert_if_absent(&pool, &WineRecord::new(WineIdentity::new("Sancerre")))
        .await
        .unwrap();
    pending.characteristics.wine_type = Some("white".to_string());
    pending.status = EnrichmentStatus::Pending;
    wines::save_enrichment(&pool, &pending).await.unwrap();
    inventory::link_to_restaurant(&pool, "bistro", pending.id, Some(65.0))
        .await
        .unwrap();

    let preference = GuestPreference {
        color: Some("white".to_string()),
        ..Default::default()
    };
    let items = inventory::load_enriched_inventory(&pool, "bistro").await.unwrap();
    let result = services.recommendations.recommend("bistro", &items, &preference).await;

    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].wine_id, verified.id);
}
