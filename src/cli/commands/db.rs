use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DbCommands {
    #[command(subcommand)]
    pub command: DbSubcommands,
}

#[derive(Subcommand)]
pub enum DbSubcommands {
    /// Show database location and statistics
    Info,
    /// Show applied and pending schema migrations
    Status,
}
