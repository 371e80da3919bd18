pub mod cars;
pub mod config;
pub mod preferences;
