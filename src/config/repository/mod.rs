//! Repository layer for database operations

pub mod cars;
pub mod preferences;
