//! Data models for the local database

use sqlx::FromRow;

/// Database representation of a stored preference
#[derive(Debug, Clone, FromRow)]
pub struct DbPreference {
    pub key: String,
    pub kind: String,
    pub value: String,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Database representation of a car
#[derive(Debug, Clone, FromRow)]
pub struct DbCar {
    pub number_plate: String,
    pub make: String,
    pub model: String,
    pub year: String,
    pub last_updated: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
