//! Repository for raw preference rows

use crate::config::models::DbPreference;
use crate::preferences::value::{RawValue, ValueKind};
use anyhow::{Context, Result};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::collections::BTreeMap;

/// Get the stored value for a key
pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<RawValue>> {
    let row: Option<(String, String)> = sqlx::query_as(
        "SELECT kind, value FROM preferences WHERE key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get preference '{}'", key))?;

    row.map(|(kind, value)| decode_row(key, &kind, &value))
        .transpose()
}

/// Insert or replace the value for a key
///
/// Takes a pool or a transaction's connection.
pub async fn set<'e, E>(executor: E, key: &str, kind: ValueKind, value: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO preferences (key, kind, value, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET
            kind = excluded.kind,
            value = excluded.value,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(kind.as_str())
    .bind(value)
    .execute(executor)
    .await
    .with_context(|| format!("Failed to set preference '{}'", key))?;

    log::debug!("Set preference: {} = {} ({})", key, value, kind);
    Ok(())
}

/// Delete a key; returns whether a row existed
pub async fn delete(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM preferences WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete preference '{}'", key))?;

    Ok(result.rows_affected() > 0)
}

/// Delete every preference; returns the number of removed rows
pub async fn clear<'e, E>(executor: E) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM preferences")
        .execute(executor)
        .await
        .context("Failed to clear preferences")?;

    log::info!("Cleared {} preference(s)", result.rows_affected());
    Ok(result.rows_affected())
}

/// List every preference as decoded values
pub async fn list(pool: &SqlitePool) -> Result<BTreeMap<String, RawValue>> {
    list_rows(pool)
        .await?
        .into_iter()
        .map(|row| {
            let value = decode_row(&row.key, &row.kind, &row.value)?;
            Ok((row.key, value))
        })
        .collect()
}

/// List every preference row as stored
pub async fn list_rows(pool: &SqlitePool) -> Result<Vec<DbPreference>> {
    sqlx::query_as::<_, DbPreference>(
        "SELECT key, kind, value, updated_at FROM preferences ORDER BY key",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list preferences")
}

fn decode_row(key: &str, kind: &str, value: &str) -> Result<RawValue> {
    let kind = ValueKind::parse(kind)
        .with_context(|| format!("Preference '{}' has an invalid kind", key))?;
    RawValue::decode(kind, value)
        .with_context(|| format!("Preference '{}' has a malformed {} value", key, kind))
}
