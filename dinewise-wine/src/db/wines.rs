//! Wine database operations
//!
//! Access patterns: point lookup by identity key, point update by id, and a
//! limited scan of wines that are not yet verified.

use chrono::{DateTime, NaiveDateTime, Utc};
use dinewise_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{EnrichmentStatus, WineCharacteristics, WineIdentity, WineRecord};

const WINE_COLUMNS: &str = r#"
    id, name, producer, vintage, region, country, varietals, wine_type,
    acidity, tannin, intensity, sweetness, body, flavor_profile, aroma,
    serving_temperature, aging_potential, food_pairing, enrichment_status,
    verification_source, rating, priority, enrichment_attempts,
    last_enrichment_error, enriched_at, created_at
"#;

/// Parse a stored timestamp (RFC 3339, or SQLite's CURRENT_TIMESTAMP format)
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", value, e)))
}

pub(crate) fn row_to_wine(row: &SqliteRow) -> Result<WineRecord> {
    let id: String = row.try_get("id")?;
    let varietals: String = row.try_get("varietals")?;
    let status: String = row.try_get("enrichment_status")?;
    let enriched_at: Option<String> = row.try_get("enriched_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(WineRecord {
        id: Uuid::parse_str(&id)?,
        identity: WineIdentity {
            name: row.try_get("name")?,
            producer: row.try_get("producer")?,
            vintage: row.try_get("vintage")?,
            region: row.try_get("region")?,
            country: row.try_get("country")?,
            varietals: serde_json::from_str(&varietals)?,
        },
        characteristics: WineCharacteristics {
            wine_type: row.try_get("wine_type")?,
            acidity: row.try_get("acidity")?,
            tannin: row.try_get("tannin")?,
            intensity: row.try_get("intensity")?,
            sweetness: row.try_get("sweetness")?,
            body: row.try_get("body")?,
            flavor_profile: row.try_get("flavor_profile")?,
            aroma: row.try_get("aroma")?,
            serving_temperature: row.try_get("serving_temperature")?,
            aging_potential: row.try_get("aging_potential")?,
            food_pairing: row.try_get("food_pairing")?,
        },
        status: status.parse().map_err(Error::Internal)?,
        verification_source: row.try_get("verification_source")?,
        rating: row.try_get("rating")?,
        priority: row.try_get("priority")?,
        enrichment_attempts: row.try_get("enrichment_attempts")?,
        last_enrichment_error: row.try_get("last_enrichment_error")?,
        enriched_at: enriched_at.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Load wine by uniqueness key (name, producer, vintage)
pub async fn find_by_identity(
    pool: &SqlitePool,
    identity: &WineIdentity,
) -> Result<Option<WineRecord>> {
    let sql = format!("SELECT {} FROM wines WHERE identity_key = ?", WINE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(identity.identity_key())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_wine).transpose()
}

/// Load wine by id
pub async fn load_wine(pool: &SqlitePool, id: Uuid) -> Result<Option<WineRecord>> {
    let sql = format!("SELECT {} FROM wines WHERE id = ?", WINE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_wine).transpose()
}

/// Insert a wine unless its identity key already exists
///
/// Returns the stored record and whether it was newly inserted. An existing
/// record is returned unchanged.
pub async fn insert_if_absent(pool: &SqlitePool, wine: &WineRecord) -> Result<(WineRecord, bool)> {
    let c = &wine.characteristics;
    let result = sqlx::query(
        r#"
        INSERT INTO wines (
            id, identity_key, name, producer, vintage, region, country, varietals,
            wine_type, acidity, tannin, intensity, sweetness, body, flavor_profile,
            aroma, serving_temperature, aging_potential, food_pairing,
            enrichment_status, verification_source, rating, priority,
            enrichment_attempts, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
        ON CONFLICT(identity_key) DO NOTHING
        "#,
    )
    .bind(wine.id.to_string())
    .bind(wine.identity.identity_key())
    .bind(&wine.identity.name)
    .bind(&wine.identity.producer)
    .bind(wine.identity.vintage)
    .bind(&wine.identity.region)
    .bind(&wine.identity.country)
    .bind(serde_json::to_string(&wine.identity.varietals)?)
    .bind(&c.wine_type)
    .bind(c.acidity)
    .bind(c.tannin)
    .bind(c.intensity)
    .bind(c.sweetness)
    .bind(&c.body)
    .bind(&c.flavor_profile)
    .bind(&c.aroma)
    .bind(&c.serving_temperature)
    .bind(&c.aging_potential)
    .bind(&c.food_pairing)
    .bind(wine.status.as_str())
    .bind(&wine.verification_source)
    .bind(wine.rating)
    .bind(wine.priority)
    .bind(wine.created_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let inserted = result.rows_affected() == 1;
    let stored = find_by_identity(pool, &wine.identity)
        .await?
        .ok_or_else(|| Error::Internal(format!("Wine vanished after insert: {}", wine.identity.identity_key())))?;

    Ok((stored, inserted))
}

/// Wines not yet verified
///
/// Highest priority first. Within a priority, wines that have not failed come
/// before failed ones, then fewest attempts, then insertion order, so wines
/// that keep failing cannot starve the rest of the queue.
pub async fn load_unverified(pool: &SqlitePool, limit: u32) -> Result<Vec<WineRecord>> {
    let sql = format!(
        "SELECT {} FROM wines WHERE enrichment_status != 'verified' \
         ORDER BY priority DESC, (enrichment_status = 'failed') ASC, \
         enrichment_attempts ASC, rowid ASC LIMIT ?",
        WINE_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(limit as i64).fetch_all(pool).await?;

    rows.iter().map(row_to_wine).collect()
}

/// Persist an enrichment result (single UPDATE by id)
///
/// Writes identity details the provider filled in, every characteristic
/// column, status, source tag, rating and attempt count.
pub async fn save_enrichment(pool: &SqlitePool, wine: &WineRecord) -> Result<()> {
    let c = &wine.characteristics;
    let result = sqlx::query(
        r#"
        UPDATE wines SET
            region = ?, country = ?, varietals = ?,
            wine_type = ?, acidity = ?, tannin = ?, intensity = ?, sweetness = ?,
            body = ?, flavor_profile = ?, aroma = ?, serving_temperature = ?,
            aging_potential = ?, food_pairing = ?,
            enrichment_status = ?, verification_source = ?, rating = ?,
            enrichment_attempts = ?, last_enrichment_error = ?, enriched_at = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&wine.identity.region)
    .bind(&wine.identity.country)
    .bind(serde_json::to_string(&wine.identity.varietals)?)
    .bind(&c.wine_type)
    .bind(c.acidity)
    .bind(c.tannin)
    .bind(c.intensity)
    .bind(c.sweetness)
    .bind(&c.body)
    .bind(&c.flavor_profile)
    .bind(&c.aroma)
    .bind(&c.serving_temperature)
    .bind(&c.aging_potential)
    .bind(&c.food_pairing)
    .bind(wine.status.as_str())
    .bind(&wine.verification_source)
    .bind(wine.rating)
    .bind(wine.enrichment_attempts)
    .bind(&wine.last_enrichment_error)
    .bind(wine.enriched_at.map(|t| t.to_rfc3339()))
    .bind(Utc::now().to_rfc3339())
    .bind(wine.id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Wine not found: {}", wine.id)));
    }
    Ok(())
}

/// Record a failed or interrupted enrichment
///
/// Verified wines are left untouched; returns whether the row changed.
pub async fn record_failure(
    pool: &SqlitePool,
    id: Uuid,
    status: EnrichmentStatus,
    attempts: u32,
    error: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE wines SET
            enrichment_status = ?,
            enrichment_attempts = enrichment_attempts + ?,
            last_enrichment_error = ?,
            updated_at = ?
        WHERE id = ? AND enrichment_status != 'verified'
        "#,
    )
    .bind(status.as_str())
    .bind(attempts as i64)
    .bind(error)
    .bind(Utc::now().to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Keep a partial enrichment result tagged `failed`
///
/// Verified wines are left untouched; returns whether the row changed.
pub async fn save_partial_enrichment(pool: &SqlitePool, wine: &WineRecord) -> Result<bool> {
    let c = &wine.characteristics;
    let result = sqlx::query(
        r#"
        UPDATE wines SET
            region = ?, country = ?, varietals = ?,
            wine_type = ?, acidity = ?, tannin = ?, intensity = ?, sweetness = ?,
            body = ?, flavor_profile = ?, aroma = ?, serving_temperature = ?,
            aging_potential = ?, food_pairing = ?, rating = ?,
            enrichment_status = 'failed', verification_source = ?,
            enrichment_attempts = ?, last_enrichment_error = ?, updated_at = ?
        WHERE id = ? AND enrichment_status != 'verified'
        "#,
    )
    .bind(&wine.identity.region)
    .bind(&wine.identity.country)
    .bind(serde_json::to_string(&wine.identity.varietals)?)
    .bind(&c.wine_type)
    .bind(c.acidity)
    .bind(c.tannin)
    .bind(c.intensity)
    .bind(c.sweetness)
    .bind(&c.body)
    .bind(&c.flavor_profile)
    .bind(&c.aroma)
    .bind(&c.serving_temperature)
    .bind(&c.aging_potential)
    .bind(&c.food_pairing)
    .bind(wine.rating)
    .bind(&wine.verification_source)
    .bind(wine.enrichment_attempts)
    .bind(&wine.last_enrichment_error)
    .bind(Utc::now().to_rfc3339())
    .bind(wine.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Wine counts per enrichment status
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(EnrichmentStatus, i64)>> {
    let rows = sqlx::query(
        "SELECT enrichment_status, COUNT(*) AS n FROM wines GROUP BY enrichment_status ORDER BY enrichment_status",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let status: String = row.try_get("enrichment_status")?;
            let count: i64 = row.try_get("n")?;
            Ok((status.parse().map_err(Error::Internal)?, count))
        })
        .collect()
}
