//! Recommendation analytics log

use chrono::Utc;
use dinewise_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Append one recommendation call to the analytics log
pub async fn insert_log(
    pool: &SqlitePool,
    restaurant_id: &str,
    preference_json: &str,
    wine_ids: &[Uuid],
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let ids: Vec<String> = wine_ids.iter().map(Uuid::to_string).collect();

    sqlx::query(
        r#"
        INSERT INTO recommendation_log (id, restaurant_id, preference, wine_ids, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(restaurant_id)
    .bind(preference_json)
    .bind(serde_json::to_string(&ids)?)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(id)
}

/// Number of logged calls for a restaurant
pub async fn count_for_restaurant(pool: &SqlitePool, restaurant_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM recommendation_log WHERE restaurant_id = ?",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
