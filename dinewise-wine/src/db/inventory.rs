//! Restaurant inventory (wines on a restaurant's list)

use dinewise_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::wines::row_to_wine;
use crate::models::InventoryItem;

/// Put a wine on a restaurant's list (price updated if already listed)
pub async fn link_to_restaurant(
    pool: &SqlitePool,
    restaurant_id: &str,
    wine_id: Uuid,
    price: Option<f64>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO restaurant_wines (restaurant_id, wine_id, price)
        VALUES (?, ?, ?)
        ON CONFLICT(restaurant_id, wine_id) DO UPDATE SET
            price = COALESCE(excluded.price, restaurant_wines.price)
        "#,
    )
    .bind(restaurant_id)
    .bind(wine_id.to_string())
    .bind(price)
    .execute(pool)
    .await?;

    Ok(())
}

const INVENTORY_SELECT: &str = r#"
    SELECT w.id, w.name, w.producer, w.vintage, w.region, w.country, w.varietals,
           w.wine_type, w.acidity, w.tannin, w.intensity, w.sweetness, w.body,
           w.flavor_profile, w.aroma, w.serving_temperature, w.aging_potential,
           w.food_pairing, w.enrichment_status, w.verification_source, w.rating,
           w.priority, w.enrichment_attempts, w.last_enrichment_error,
           w.enriched_at, w.created_at, rw.price
    FROM restaurant_wines rw
    JOIN wines w ON w.id = rw.wine_id
    WHERE rw.restaurant_id = ?
"#;

async fn fetch_inventory(pool: &SqlitePool, sql: &str, restaurant_id: &str) -> Result<Vec<InventoryItem>> {
    let rows = sqlx::query(sql).bind(restaurant_id).fetch_all(pool).await?;

    rows.iter()
        .map(|row| {
            Ok(InventoryItem {
                wine: row_to_wine(row)?,
                price: row.try_get("price")?,
            })
        })
        .collect()
}

/// Every wine on a restaurant's list, with its listed price
pub async fn load_inventory(pool: &SqlitePool, restaurant_id: &str) -> Result<Vec<InventoryItem>> {
    let sql = format!("{} ORDER BY w.rowid ASC", INVENTORY_SELECT);
    fetch_inventory(pool, &sql, restaurant_id).await
}

/// Verified wines on a restaurant's list (what recommendations score)
///
/// Unverified wines and partial `failed` results carry too little data to
/// score fairly against fully researched ones.
pub async fn load_enriched_inventory(pool: &SqlitePool, restaurant_id: &str) -> Result<Vec<InventoryItem>> {
    let sql = format!(
        "{} AND w.enrichment_status = 'verified' ORDER BY w.rowid ASC",
        INVENTORY_SELECT
    );
    fetch_inventory(pool, &sql, restaurant_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::wines::{insert_if_absent, record_failure, save_enrichment};
    use crate::models::{EnrichmentStatus, WineIdentity, WineRecord};
    use dinewise_common::db::init_memory_database;

    #[tokio::test]
    async fn test_link_and_load_inventory() {
        let pool = init_memory_database().await.unwrap();
        let (wine, _) = insert_if_absent(&pool, &WineRecord::new(WineIdentity::new("Rioja Reserva")))
            .await
            .unwrap();

        link_to_restaurant(&pool, "r-1", wine.id, Some(54.0)).await.unwrap();
        // Relinking without a price keeps the known price
        link_to_restaurant(&pool, "r-1", wine.id, None).await.unwrap();

        let items = load_inventory(&pool, "r-1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price, Some(54.0));
        assert_eq!(items[0].wine.identity.name, "Rioja Reserva");

        assert!(load_inventory(&pool, "r-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enriched_inventory_only_returns_verified_wines() {
        let pool = init_memory_database().await.unwrap();
        let mut ids = Vec::new();
        for name in ["Verified Syrah", "Fresh Arrival", "Partial Merlot"] {
            let (wine, _) = insert_if_absent(&pool, &WineRecord::new(WineIdentity::new(name)))
                .await
                .unwrap();
            link_to_restaurant(&pool, "r-1", wine.id, None).await.unwrap();
            ids.push(wine);
        }

        let mut verified = ids[0].clone();
        verified.status = EnrichmentStatus::Verified;
        save_enrichment(&pool, &verified).await.unwrap();
        record_failure(&pool, ids[2].id, EnrichmentStatus::Failed, 3, "quality").await.unwrap();

        assert_eq!(load_inventory(&pool, "r-1").await.unwrap().len(), 3);
        let enriched = load_enriched_inventory(&pool, "r-1").await.unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].wine.identity.name, "Verified Syrah");
    }
}
