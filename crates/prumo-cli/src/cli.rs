//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Prumo - Personal finance assistant for Brazilian Portuguese questions
#[derive(Parser)]
#[command(name = "prumo")]
#[command(about = "Local-first personal finance assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "prumo.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set PRUMO_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// User whose data is read and written
    #[arg(short, long, default_value = "1", global = true)]
    pub user: i64,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from CSV
    ///
    /// Expected columns: date, type, category, amount and an optional
    /// description (English or Portuguese headers). Rows already imported
    /// for this user are skipped.
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Record a single transaction by hand
    Add {
        /// income/receita or expense/despesa
        kind: String,

        /// Category, e.g. Mercado or Salário
        category: String,

        /// Amount, e.g. 1234.56 or "1.234,56"
        amount: String,

        /// Date (YYYY-MM-DD or DD/MM/YYYY), defaults to today
        #[arg(short, long)]
        date: Option<String>,

        /// Free-form note
        #[arg(long)]
        description: Option<String>,
    },

    /// Ask a question in Portuguese
    Ask {
        /// The question, e.g. "como investir R$ 1.000?"
        question: String,

        /// Reference date for the analysis (defaults to the latest transaction)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Show the financial report: score, trends, alerts and projection
    Report {
        /// Months of history to analyze
        #[arg(short, long, default_value = "12")]
        months: u32,

        /// Months ahead to project
        #[arg(long, default_value = "3")]
        ahead: u32,
    },

    /// Show or change the adaptive profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },

    /// Split an amount across the profile's investment buckets
    Allocate {
        /// Amount to allocate
        #[arg(short, long)]
        amount: String,
    },

    /// Show recent questions and answers
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },

    /// List recent transactions
    Transactions {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the current profile (default)
    Show,

    /// Set the risk profile: conservative, moderate or aggressive
    SetRisk {
        /// Risk profile (English or Portuguese name)
        profile: String,
    },
}
