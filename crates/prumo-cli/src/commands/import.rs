//! Import and manual entry command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use prumo_core::{
    db::Database,
    import::{parse_amount, parse_csv, parse_date},
    models::{Transaction, TransactionKind},
    text::format_brl,
};
use tracing::info;

pub fn cmd_import(db: &Database, user_id: i64, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Importing {}...", file.display());

    let transactions = parse_csv(csv_file)
        .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
    println!("   Found {} transactions", transactions.len());

    let summary = db
        .import_transactions(user_id, &transactions)
        .context("Failed to store transactions")?;
    info!(
        user_id,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "Import finished"
    );

    println!("✅ Import complete!");
    println!("   Imported: {}", summary.inserted);
    println!("   Skipped (duplicates): {}", summary.duplicates);

    if summary.inserted > 0 {
        println!();
        println!("   Try: prumo report");
    }

    Ok(())
}

pub fn cmd_add(
    db: &Database,
    user_id: i64,
    kind: &str,
    category: &str,
    amount: &str,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let kind: TransactionKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let category = category.trim();
    if category.is_empty() {
        anyhow::bail!("Category must not be empty");
    }

    let amount = parse_amount(amount).with_context(|| format!("Invalid amount: {}", amount))?;
    if amount < 0.0 {
        anyhow::bail!("Amount must be positive; use the kind to record an expense");
    }

    let date = match date {
        Some(s) => parse_date(s).with_context(|| format!("Invalid date: {}", s))?,
        None => Local::now().date_naive(),
    };

    let tx = Transaction::new(kind, category, amount, date);
    let id = db
        .add_transaction(user_id, &tx, description)
        .context("Failed to store transaction")?;

    let sign = match kind {
        TransactionKind::Income => "+",
        TransactionKind::Expense => "-",
    };
    println!(
        "✅ Added transaction {}: {} │ {}{} │ {}",
        id,
        date,
        sign,
        format_brl(amount),
        category
    );

    Ok(())
}
