//! SQLite-backed local state for RoadRater
//!
//! This module owns the database file and provides:
//! - The typed, observable preference store
//! - Car records keyed by number plate
//! - TOML export/import for backup and restore
//! - Schema migrations and database diagnostics

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod compat;
pub mod db;
pub mod migrations;
pub mod models;
pub mod repository;

pub use compat::TransferSummary;
pub use models::*;

use crate::cars::Car;
use crate::preferences::{PreferenceStore, SqliteBackend};

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "ROADRATER_DB";

/// Main configuration manager using SQLite backend
pub struct Config {
    pub(crate) pool: sqlx::SqlitePool,
    db_path: PathBuf,
    backend: Arc<SqliteBackend>,

    /// Typed, observable preferences
    pub preferences: PreferenceStore,
}

impl Config {
    /// Get the path to the SQLite database file
    pub fn get_db_path() -> Result<PathBuf> {
        if let Ok(path) = dotenvy::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                log::debug!("Using database path from {}: {}", DB_PATH_ENV, path);
                return Ok(PathBuf::from(path));
            }
        }

        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("roadrater")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".roadrater")
        };

        Ok(config_dir.join("roadrater.db"))
    }

    /// Open the default database
    pub async fn load() -> Result<Self> {
        let db_path = Self::get_db_path()?;
        Self::open(&db_path).await
    }

    /// Open (creating if needed) the database at `db_path` and migrate it
    pub async fn open(db_path: &Path) -> Result<Self> {
        log::debug!("Loading config from: {:?}", db_path);

        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
                log::info!("Created config directory: {:?}", dir);
            }
        }

        let pool = db::connect(db_path).await?;
        db::run_migrations(&pool).await?;

        Ok(Self::from_pool(pool, db_path.to_path_buf()))
    }

    /// Create a new config for testing (in-memory database)
    pub async fn new_test() -> Result<Self> {
        let pool = db::connect_memory().await?;
        db::run_migrations(&pool).await?;

        Ok(Self::from_pool(pool, PathBuf::from(":memory:")))
    }

    fn from_pool(pool: sqlx::SqlitePool, db_path: PathBuf) -> Self {
        let backend = Arc::new(SqliteBackend::new(pool.clone()));
        let preferences = PreferenceStore::new(backend.clone());
        Self {
            pool,
            db_path,
            backend,
            preferences,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The SQLite backend behind `preferences`
    pub fn backend(&self) -> &Arc<SqliteBackend> {
        &self.backend
    }

    // Car methods
    pub async fn save_car(&self, car: &Car) -> Result<bool> {
        repository::cars::upsert(&self.pool, car).await
    }

    pub async fn get_car(&self, number_plate: &str) -> Result<Option<Car>> {
        repository::cars::get(&self.pool, number_plate).await
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>> {
        repository::cars::list(&self.pool).await
    }

    pub async fn list_cars_by_make(&self, make: &str) -> Result<Vec<Car>> {
        repository::cars::list_by_make(&self.pool, make).await
    }

    pub async fn delete_car(&self, number_plate: &str) -> Result<()> {
        repository::cars::delete(&self.pool, number_plate).await
    }

    // Backup/restore
    pub async fn export_toml(&self, path: &Path) -> Result<TransferSummary> {
        compat::export_to_toml(&self.backend, path).await
    }

    pub async fn import_toml(&self, path: &Path) -> Result<TransferSummary> {
        compat::import_from_toml(&self.backend, path).await
    }

    // Diagnostics
    pub async fn db_info(&self) -> Result<db::DatabaseInfo> {
        db::get_db_info(&self.pool).await
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::status(&self.pool).await
    }
}
