// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin launcher and database-maintenance binary. Day-to-day job and
//! preset management goes through the HTTP API and the UI; this exists
//! only to start the server process and to perform the handful of
//! maintenance operations that make no sense as HTTP endpoints.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sg-cli", about = "Launcher and database maintenance for the sample grid service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server in the foreground.
    Serve {
        /// Path to the SQLite database (overrides SG_DATABASE_PATH).
        #[arg(long)]
        database_path: Option<std::path::PathBuf>,
    },
    /// Apply pending migrations to the database and exit.
    Migrate {
        /// Path to the SQLite database (overrides SG_DATABASE_PATH).
        #[arg(long)]
        database_path: Option<std::path::PathBuf>,
    },
    /// Delete the database file so the next startup recreates it from
    /// scratch. Refuses unless `--yes` is also passed.
    ResetDb {
        #[arg(long)]
        database_path: Option<std::path::PathBuf>,
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(commands::env::log_level()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { database_path } => commands::serve::run(database_path).await,
        Command::Migrate { database_path } => commands::migrate::run(database_path).await,
        Command::ResetDb { database_path, yes } => commands::reset_db::run(database_path, yes).await,
    }
}
