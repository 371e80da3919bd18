pub mod cars;
pub mod db;
pub mod prefs;
