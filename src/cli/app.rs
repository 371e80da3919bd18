use super::commands::cars::CarsCommands;
use super::commands::db::DbCommands;
use super::commands::prefs::PrefsCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roadrater")]
#[command(about = "Manage RoadRater preferences and car records on this machine")]
pub struct Cli {
    /// Database file (overrides ROADRATER_DB and the default location)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Typed preference management
    Prefs(PrefsCommands),
    /// Car record management
    Cars(CarsCommands),
    /// Export preferences and cars to a TOML file
    Export {
        /// Destination file
        path: PathBuf,
    },
    /// Replace preferences and cars with the contents of a TOML file
    Import {
        /// Source file
        path: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Database diagnostics
    Db(DbCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::prefs::PrefsSubcommands;
    use roadrater::preferences::ValueKind;

    #[test]
    fn test_parse_prefs_set_with_kind() {
        let cli = Cli::parse_from(["roadrater", "prefs", "set", "volume", "80", "--kind", "int"]);
        match cli.command {
            Commands::Prefs(PrefsCommands {
                command: PrefsSubcommands::Set { key, value, kind },
            }) => {
                assert_eq!(key, "volume");
                assert_eq!(value, "80");
                assert_eq!(kind, Some(ValueKind::Int));
            }
            _ => panic!("expected prefs set"),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result = Cli::try_parse_from(["roadrater", "prefs", "set", "a", "b", "--kind", "blob"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_db_flag() {
        let cli = Cli::parse_from(["roadrater", "db", "info", "--db", "/tmp/x.db"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
    }
}
