pub mod cars;
pub mod db;
pub mod prefs;
pub mod transfer;
