//! Repository for car records

use crate::cars::Car;
use crate::config::models::DbCar;
use anyhow::{Context, Result};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};

const SELECT_CARS: &str =
    "SELECT number_plate, make, model, year, last_updated, created_at FROM cars";

/// Insert a car, or update the existing row with the same plate
///
/// Returns `true` when the car was new.
pub async fn upsert(pool: &SqlitePool, car: &Car) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to start car transaction")?;
    let created = upsert_in(&mut tx, car).await?;
    tx.commit()
        .await
        .context("Failed to commit car transaction")?;
    Ok(created)
}

/// [`upsert`] on a connection the caller already holds a transaction on
///
/// The insert takes the write lock, so the update that follows a conflict
/// cannot race with another writer.
pub async fn upsert_in(conn: &mut SqliteConnection, car: &Car) -> Result<bool> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO cars (number_plate, make, model, year, last_updated)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(number_plate) DO NOTHING
        "#,
    )
    .bind(&car.number_plate)
    .bind(&car.make)
    .bind(&car.model)
    .bind(&car.year)
    .bind(car.last_updated)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to save car '{}'", car.number_plate))?
    .rows_affected()
        == 1;

    if !inserted {
        sqlx::query(
            r#"
            UPDATE cars SET make = ?, model = ?, year = ?, last_updated = ?
            WHERE number_plate = ?
            "#,
        )
        .bind(&car.make)
        .bind(&car.model)
        .bind(&car.year)
        .bind(car.last_updated)
        .bind(&car.number_plate)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update car '{}'", car.number_plate))?;
    }

    log::info!(
        "{} car: {} ({} {} {})",
        if inserted { "Added" } else { "Updated" },
        car.number_plate,
        car.make,
        car.model,
        car.year
    );
    Ok(inserted)
}

/// Get car by number plate
pub async fn get(pool: &SqlitePool, number_plate: &str) -> Result<Option<Car>> {
    let row: Option<DbCar> = sqlx::query_as(&format!("{} WHERE number_plate = ?", SELECT_CARS))
        .bind(number_plate)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get car '{}'", number_plate))?;

    Ok(row.map(Car::from))
}

/// List all cars ordered by plate
pub async fn list(pool: &SqlitePool) -> Result<Vec<Car>> {
    let rows: Vec<DbCar> = sqlx::query_as(&format!("{} ORDER BY number_plate", SELECT_CARS))
        .fetch_all(pool)
        .await
        .context("Failed to list cars")?;

    Ok(rows.into_iter().map(Car::from).collect())
}

/// List cars of one make (case-insensitive), ordered by model then plate
pub async fn list_by_make(pool: &SqlitePool, make: &str) -> Result<Vec<Car>> {
    let rows: Vec<DbCar> = sqlx::query_as(&format!(
        "{} WHERE make = ? COLLATE NOCASE ORDER BY model, number_plate",
        SELECT_CARS
    ))
    .bind(make)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list cars made by '{}'", make))?;

    Ok(rows.into_iter().map(Car::from).collect())
}

/// Delete car by number plate
pub async fn delete(pool: &SqlitePool, number_plate: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM cars WHERE number_plate = ?")
        .bind(number_plate)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete car '{}'", number_plate))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Car '{}' not found", number_plate);
    }

    log::info!("Deleted car: {}", number_plate);
    Ok(())
}

/// Delete every car; used before an import
pub async fn clear<'e, E>(executor: E) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM cars")
        .execute(executor)
        .await
        .context("Failed to clear cars")?;
    Ok(())
}

impl From<DbCar> for Car {
    fn from(row: DbCar) -> Self {
        Self {
            number_plate: row.number_plate,
            make: row.make,
            model: row.model,
            year: row.year,
            last_updated: row.last_updated,
        }
    }
}
