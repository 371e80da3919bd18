//! Car records observed by the client

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A car identified by its number plate
///
/// `year` is kept as entered; plates are stored exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub number_plate: String,
    pub make: String,
    pub model: String,
    pub year: String,
    /// Milliseconds since the Unix epoch
    pub last_updated: i64,
}

impl Car {
    /// New record stamped with the current time
    pub fn new(
        number_plate: impl Into<String>,
        make: impl Into<String>,
        model: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            number_plate: number_plate.into(),
            make: make.into(),
            model: model.into(),
            year: year.into(),
            last_updated: Utc::now().timestamp_millis(),
        }
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_updated).single()
    }
}
