//! Prumo CLI - Personal finance assistant
//!
//! Usage:
//!   prumo init                     Initialize database
//!   prumo import --file CSV        Import transactions
//!   prumo ask "como investir?"     Ask a question in Portuguese
//!   prumo report --months 6        Show score, trends and alerts

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::Output;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let output = if cli.json { Output::Json } else { Output::Text };

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, cli.user, &file)
        }
        Commands::Add {
            kind,
            category,
            amount,
            date,
            description,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_add(
                &db,
                cli.user,
                &kind,
                &category,
                &amount,
                date.as_deref(),
                description.as_deref(),
            )
        }
        Commands::Ask { question, as_of } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_ask(&db, cli.user, &question, as_of.as_deref(), output)
        }
        Commands::Report { months, ahead } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_report(&db, cli.user, months, ahead, output)
        }
        Commands::Profile { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(ProfileAction::Show) => {
                    commands::cmd_profile_show(&db, cli.user, output)
                }
                Some(ProfileAction::SetRisk { profile }) => {
                    commands::cmd_profile_set_risk(&db, cli.user, &profile)
                }
            }
        }
        Commands::Allocate { amount } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_allocate(&db, cli.user, &amount, output)
        }
        Commands::History { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_history(&db, cli.user, limit, output)
        }
        Commands::Transactions { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_transactions_list(&db, cli.user, limit)
        }
    }
}
