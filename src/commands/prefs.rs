use anyhow::Result;
use colored::Colorize;
use futures::StreamExt;
use log::info;
use std::time::Duration;

use crate::cli::commands::prefs::PrefsSubcommands;
use crate::ui::prompts::prompt_clear_confirmation;
use roadrater::config::Config;
use roadrater::preferences::{RawValue, ValueKind};

pub async fn prefs_command(config: &Config, command: PrefsSubcommands) -> Result<()> {
    match command {
        PrefsSubcommands::List => list_command(config).await,
        PrefsSubcommands::Get { key } => get_command(config, &key).await,
        PrefsSubcommands::Set { key, value, kind } => {
            set_command(config, &key, &value, kind).await
        }
        PrefsSubcommands::Remove { key } => remove_command(config, &key).await,
        PrefsSubcommands::Clear { force } => clear_command(config, force).await,
        PrefsSubcommands::Watch { key, interval_ms } => {
            watch_command(config, &key, Duration::from_millis(interval_ms)).await
        }
    }
}

async fn list_command(config: &Config) -> Result<()> {
    let values = config.preferences.get_all().await?;

    if values.is_empty() {
        println!("  {}", "No preferences stored".dimmed());
        return Ok(());
    }

    println!("  {}", "Preferences:".bright_white().bold());
    for (key, value) in &values {
        println!("    {} = {}", key.cyan(), describe(value));
    }
    Ok(())
}

async fn get_command(config: &Config, key: &str) -> Result<()> {
    match config.preferences.get_untyped(key).read().await? {
        Some(value) => println!("{}", describe(&value)),
        None => anyhow::bail!("Preference '{}' is not set", key),
    }
    Ok(())
}

async fn set_command(
    config: &Config,
    key: &str,
    input: &str,
    kind: Option<ValueKind>,
) -> Result<()> {
    let handle = config.preferences.get_untyped(key);

    let kind = match kind {
        Some(kind) => kind,
        None => handle
            .read()
            .await?
            .map(|current| current.kind())
            .unwrap_or(ValueKind::String),
    };
    let value = RawValue::parse_input(kind, input)?;

    info!("Setting preference {} to {} ({})", key, value, kind);
    handle.write(Some(value.clone())).await?;

    println!(
        "{} Set '{}' to {}",
        "✓".bright_green().bold(),
        key.bright_green().bold(),
        describe(&value)
    );
    Ok(())
}

async fn remove_command(config: &Config, key: &str) -> Result<()> {
    let handle = config.preferences.get_untyped(key);
    if !handle.is_set().await? {
        anyhow::bail!("Preference '{}' is not set", key);
    }

    handle.delete().await?;
    println!("{} Removed '{}'", "✓".bright_green().bold(), key.bright_green().bold());
    Ok(())
}

async fn clear_command(config: &Config, force: bool) -> Result<()> {
    let count = config.preferences.get_all().await?.len();
    if count == 0 {
        println!("  {}", "No preferences stored".dimmed());
        return Ok(());
    }

    if !force && !prompt_clear_confirmation(count)? {
        println!("{} Cancelled.", "❌".bright_red().bold());
        return Ok(());
    }

    config.preferences.clear().await?;
    println!("{} Removed {} preference(s)", "✓".bright_green().bold(), count);
    Ok(())
}

async fn watch_command(config: &Config, key: &str, interval: Duration) -> Result<()> {
    info!("Watching preference {} (poll every {:?})", key, interval);

    // Writes from other processes only show up through the poller
    let _external = config.backend().watch_external_changes(interval).await?;
    let mut values = config.preferences.get_untyped(key).observe();

    println!(
        "{} {} {}",
        "Watching".bright_white().bold(),
        key.cyan(),
        "(Ctrl+C to stop)".dimmed()
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            next = values.next() => match next {
                Some(Ok(Some(value))) => {
                    println!("  {} {}", "●".bright_green(), describe(&value))
                }
                Some(Ok(None)) => println!("  {} {}", "○".dimmed(), "(not set)".dimmed()),
                Some(Err(e)) => return Err(e),
                None => break,
            },
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}

fn describe(value: &RawValue) -> String {
    format!("{} {}", value, format!("({})", value.kind()).dimmed())
}
