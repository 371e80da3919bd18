//! Forward-only schema migrations embedded in the binary
//!
//! Each script runs once inside a transaction and is recorded in
//! `schema_migrations` with the SHA-256 of its text. A recorded script that
//! no longer matches, or that this build does not know, stops startup
//! before anything touches the data.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// One embedded schema script
#[derive(Debug)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration, in version order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial",
        sql: include_str!("files/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "indexes",
        sql: include_str!("files/002_indexes.sql"),
    },
];

impl Migration {
    pub fn checksum(&self) -> String {
        checksum(self.sql)
    }
}

/// Hex SHA-256 of a script; CRLF checkouts hash like LF ones
fn checksum(sql: &str) -> String {
    let normalized = sql.replace("\r\n", "\n");
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Row of `schema_migrations`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub checksum: String,
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<&'static Migration>,
}

impl MigrationStatus {
    pub fn current_version(&self) -> Option<i64> {
        self.applied.iter().map(|m| m.version).max()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Apply every pending migration
pub async fn run(pool: &SqlitePool) -> Result<()> {
    let status = status(pool).await?;
    if status.is_up_to_date() {
        debug!("Schema is up to date at version {:?}", status.current_version());
        return Ok(());
    }

    info!("Applying {} migration(s)", status.pending.len());
    for migration in status.pending {
        apply(pool, migration).await?;
    }
    Ok(())
}

/// Applied and pending migrations, after checking the recorded ones
pub async fn status(pool: &SqlitePool) -> Result<MigrationStatus> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            checksum TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    let applied: Vec<AppliedMigration> = sqlx::query_as(
        "SELECT version, name, applied_at, checksum FROM schema_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .context("Failed to read applied migrations")?;

    for record in &applied {
        let Some(migration) = MIGRATIONS.iter().find(|m| m.version == record.version) else {
            anyhow::bail!(
                "Database has migration {} '{}' unknown to this build",
                record.version,
                record.name
            );
        };
        if record.checksum != migration.checksum() {
            anyhow::bail!(
                "Migration {} '{}' was modified after it was applied",
                record.version,
                record.name
            );
        }
    }

    let pending = MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|record| record.version == m.version))
        .collect();

    Ok(MigrationStatus { applied, pending })
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    info!("Applying migration {} '{}'", migration.version, migration.name);

    let mut tx = pool
        .begin()
        .await
        .context("Failed to start migration transaction")?;

    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to execute migration {}", migration.version))?;

    sqlx::query("INSERT INTO schema_migrations (version, name, checksum) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .bind(migration.checksum())
        .execute(&mut *tx)
        .await
        .context("Failed to record migration")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")?;
    Ok(())
}
