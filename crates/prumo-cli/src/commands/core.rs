//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `resolve_as_of` - Reference date for analyses
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use prumo_core::{db::Database, import::parse_date};
use tracing::info;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Reference date: an explicit date, else the latest transaction, else today
pub fn resolve_as_of(db: &Database, user_id: i64, explicit: Option<&str>) -> Result<NaiveDate> {
    if let Some(s) = explicit {
        return parse_date(s).with_context(|| format!("Invalid date: {}", s));
    }
    let latest = db
        .latest_transaction_date(user_id)
        .context("Failed to read latest transaction date")?;
    Ok(latest.unwrap_or_else(|| Local::now().date_naive()))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    info!(path = db.path(), encrypted = db.is_encrypted(), "Database ready");

    if db.is_encrypted() {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: prumo import --file extrato.csv");
    println!("  2. Ask a question: prumo ask \"como posso economizar?\"");

    Ok(())
}
