use anyhow::Result;
use colored::Colorize;

use crate::cli::commands::db::DbSubcommands;
use roadrater::config::Config;

pub async fn db_command(config: &Config, command: DbSubcommands) -> Result<()> {
    match command {
        DbSubcommands::Info => {
            let info = config.db_info().await?;
            println!("{}", "Database".bright_white().bold());
            println!("  Path: {}", config.db_path().display().to_string().cyan());
            println!("  SQLite version: {}", info.sqlite_version);
            println!("  Schema version: {}", info.schema_version);
            println!("  Journal mode: {}", info.journal_mode);
            println!("  Tables: {}", info.table_count);
            println!("  Preferences: {}", info.preference_count);
            println!("  Cars: {}", info.car_count);
        }
        DbSubcommands::Status => {
            let status = config.migration_status().await?;
            match status.current_version() {
                Some(version) => println!("Schema version: {}", version.to_string().cyan()),
                None => println!("Schema version: {}", "none".dimmed()),
            }

            for migration in &status.applied {
                println!(
                    "  {} {:03} {} {}",
                    "✓".bright_green(),
                    migration.version,
                    migration.name,
                    migration.applied_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
                );
            }
            for migration in &status.pending {
                println!(
                    "  {} {:03} {} {}",
                    "○".bright_yellow(),
                    migration.version,
                    migration.name,
                    "(pending)".dimmed()
                );
            }

            if status.is_up_to_date() {
                println!("{} Up to date", "✓".bright_green().bold());
            }
        }
    }
    Ok(())
}
