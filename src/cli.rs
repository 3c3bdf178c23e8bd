// src/cli.rs
//! Command-line interface definitions

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poll-schema")]
#[command(about = "Schema migrations and coin poll service")]
#[command(version)]
pub struct Cli {
    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Apply pending migrations
    Migrate,
    /// Show applied and pending migrations
    Status,
    /// Migrate, then serve the coin poll API
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Pull ticker prices into the selected coins
    RefreshPrices,
}
