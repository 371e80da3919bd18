//! TOML export/import of the local database

use crate::cars::Car;
use crate::config::repository;
use crate::preferences::sqlite::Snapshot;
use crate::preferences::{PreferenceBackend, RawValue, SqliteBackend};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Counts of what an export or import carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    pub preferences: usize,
    pub cars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ExportFile {
    #[serde(default)]
    preferences: BTreeMap<String, RawValue>,
    #[serde(default)]
    cars: Vec<Car>,
}

/// Export preferences and cars to a TOML file
pub async fn export_to_toml(backend: &SqliteBackend, path: &Path) -> Result<TransferSummary> {
    log::info!("Exporting database to TOML: {:?}", path);

    let file = ExportFile {
        preferences: backend.get_all_raw().await?,
        cars: repository::cars::list(backend.pool()).await?,
    };
    let summary = TransferSummary {
        preferences: file.preferences.len(),
        cars: file.cars.len(),
    };

    let toml_content =
        toml::to_string_pretty(&file).context("Failed to serialize database to TOML")?;

    std::fs::write(path, toml_content)
        .with_context(|| format!("Failed to write TOML file: {:?}", path))?;

    log::info!(
        "Exported {} preference(s) and {} car(s)",
        summary.preferences,
        summary.cars
    );
    Ok(summary)
}

/// Replace the database contents with a TOML export
///
/// The wipe and refill commit as one transaction; a failed import leaves
/// the previous data in place. Observers get a `Cleared` change only after
/// the commit.
pub async fn import_from_toml(backend: &SqliteBackend, path: &Path) -> Result<TransferSummary> {
    log::info!("Importing TOML to database: {:?}", path);

    let toml_content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read TOML file: {:?}", path))?;

    let file: ExportFile = toml::from_str(&toml_content)
        .with_context(|| format!("Failed to parse TOML file: {:?}", path))?;

    let mut rows = Snapshot::new();
    let mut tx = backend
        .pool()
        .begin()
        .await
        .context("Failed to start import transaction")?;

    repository::preferences::clear(&mut *tx).await?;
    repository::cars::clear(&mut *tx).await?;

    for (key, value) in &file.preferences {
        let kind = value.kind();
        let encoded = value
            .encode()
            .with_context(|| format!("Failed to encode preference '{}'", key))?;
        repository::preferences::set(&mut *tx, key, kind, &encoded)
            .await
            .with_context(|| format!("Failed to import preference '{}'", key))?;
        rows.insert(key.clone(), (kind.as_str().to_string(), encoded));
    }
    for car in &file.cars {
        repository::cars::upsert_in(&mut tx, car).await?;
    }

    tx.commit()
        .await
        .context("Failed to commit import transaction")?;
    backend.replaced(rows);

    let summary = TransferSummary {
        preferences: file.preferences.len(),
        cars: file.cars.len(),
    };
    log::info!(
        "Imported {} preference(s) and {} car(s)",
        summary.preferences,
        summary.cars
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_format() {
        let mut file = ExportFile::default();
        file.preferences
            .insert("volume".to_string(), RawValue::Int(80));
        file.preferences.insert(
            "tags".to_string(),
            RawValue::StringSet(["a".to_string(), "b".to_string()].into()),
        );

        let text = toml::to_string_pretty(&file).unwrap();
        assert!(text.contains("kind = \"int\""));
        assert!(text.contains("kind = \"string_set\""));

        let parsed: ExportFile = toml::from_str(&text).unwrap();
        assert_eq!(parsed.preferences, file.preferences);
        assert!(parsed.cars.is_empty());
    }

    #[test]
    fn test_empty_file_parses() {
        let parsed: ExportFile = toml::from_str("").unwrap();
        assert!(parsed.preferences.is_empty());
    }

    async fn setup_backend() -> SqliteBackend {
        let pool = crate::config::db::connect_memory().await.unwrap();
        crate::config::db::run_migrations(&pool).await.unwrap();
        SqliteBackend::new(pool)
    }

    #[tokio::test]
    async fn test_failed_import_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.toml");

        let backend = setup_backend().await;
        backend.set_raw("volume", RawValue::Int(80)).await.unwrap();
        repository::cars::upsert(backend.pool(), &Car::new("ABC123", "Toyota", "Corolla", "2012"))
            .await
            .unwrap();
        export_to_toml(&backend, &path).await.unwrap();

        // Break the refill half-way: preferences import fine, cars cannot
        sqlx::query("DROP TABLE cars")
            .execute(backend.pool())
            .await
            .unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        backend.register_listener(std::sync::Arc::new(move |change| {
            let _ = tx.send(change);
        }));

        assert!(import_from_toml(&backend, &path).await.is_err());

        let remaining = backend.get_all_raw().await.unwrap();
        assert_eq!(remaining.get("volume"), Some(&RawValue::Int(80)));
        assert!(rx.try_recv().is_err(), "failed import must not notify");
    }

    #[tokio::test]
    async fn test_import_notifies_cleared_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.toml");
        std::fs::write(&path, "[preferences.volume]\nkind = \"int\"\nvalue = 80\n").unwrap();

        let backend = setup_backend().await;
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        backend.register_listener(std::sync::Arc::new(move |change| {
            let _ = tx.send(change);
        }));

        let summary = import_from_toml(&backend, &path).await.unwrap();
        assert_eq!(summary, TransferSummary { preferences: 1, cars: 0 });
        assert_eq!(rx.try_recv().unwrap(), crate::preferences::KeyChange::Cleared);
        assert_eq!(backend.get_raw("volume").await.unwrap(), Some(RawValue::Int(80)));
    }
}
