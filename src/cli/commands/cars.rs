use clap::{Args, Subcommand};

#[derive(Args)]
pub struct CarsCommands {
    #[command(subcommand)]
    pub command: CarsSubcommands,
}

#[derive(Subcommand)]
pub enum CarsSubcommands {
    /// Add a car, or update the one with the same plate
    Add {
        /// Number plate
        plate: String,
        make: String,
        model: String,
        year: String,
    },
    /// Show one car
    Get {
        /// Number plate
        plate: String,
    },
    /// List cars
    List {
        /// Only cars of this make
        #[arg(short, long)]
        make: Option<String>,
    },
    /// Remove a car
    Remove {
        /// Number plate
        plate: String,
    },
}
