use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::ui::prompts::prompt_import_confirmation;
use roadrater::config::Config;

pub async fn export_command(config: &Config, path: &Path) -> Result<()> {
    let summary = config.export_toml(path).await?;
    println!(
        "{} Exported {} preference(s) and {} car(s) to {}",
        "✓".bright_green().bold(),
        summary.preferences,
        summary.cars,
        path.display().to_string().cyan()
    );
    Ok(())
}

pub async fn import_command(config: &Config, path: &Path, force: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    if !force && !prompt_import_confirmation(path)? {
        println!("{} Cancelled.", "❌".bright_red().bold());
        return Ok(());
    }

    let summary = config.import_toml(path).await?;
    println!(
        "{} Imported {} preference(s) and {} car(s)",
        "✓".bright_green().bold(),
        summary.preferences,
        summary.cars
    );
    Ok(())
}
