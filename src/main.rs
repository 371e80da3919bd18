use anyhow::Result;
use clap::Parser;
use log::{debug, info};

mod cli;
mod commands;
mod ui;

use cli::{Cli, Commands};
use roadrater::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    info!("Starting roadrater");

    // Open the database and run migrations before any command
    let config = match &cli.db {
        Some(path) => Config::open(path).await?,
        None => Config::load().await?,
    };
    debug!("Using database at {:?}", config.db_path());

    match cli.command {
        Commands::Prefs(prefs) => commands::prefs::prefs_command(&config, prefs.command).await,
        Commands::Cars(cars) => commands::cars::cars_command(&config, cars.command).await,
        Commands::Export { path } => commands::transfer::export_command(&config, &path).await,
        Commands::Import { path, force } => {
            commands::transfer::import_command(&config, &path, force).await
        }
        Commands::Db(db) => commands::db::db_command(&config, db.command).await,
    }
}
