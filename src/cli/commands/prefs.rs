use clap::{Args, Subcommand};
use roadrater::preferences::ValueKind;

#[derive(Args)]
pub struct PrefsCommands {
    #[command(subcommand)]
    pub command: PrefsSubcommands,
}

#[derive(Subcommand)]
pub enum PrefsSubcommands {
    /// List every stored preference
    List,
    /// Show the stored value of a preference
    Get {
        /// Preference key
        key: String,
    },
    /// Store a value for a preference
    Set {
        /// Preference key
        key: String,
        /// Value; string sets are comma separated
        value: String,
        /// Value kind (defaults to the stored kind, or string for new keys)
        #[arg(short, long, value_parser = parse_kind)]
        kind: Option<ValueKind>,
    },
    /// Remove a preference
    Remove {
        /// Preference key
        key: String,
    },
    /// Remove every preference
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print the value of a preference every time it changes
    Watch {
        /// Preference key
        key: String,
        /// How often to check the database for changes made by other processes
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn parse_kind(s: &str) -> Result<ValueKind, String> {
    ValueKind::parse(s).map_err(|e| e.to_string())
}
