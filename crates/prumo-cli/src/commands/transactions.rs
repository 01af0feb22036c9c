//! Transaction command implementations

use anyhow::Result;
use prumo_core::{db::Database, models::TransactionKind, text::format_brl};

use super::truncate;

pub fn cmd_transactions_list(db: &Database, user_id: i64, limit: i64) -> Result<()> {
    let transactions = db.list_transactions(user_id, limit)?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  prumo import --file extrato.csv");
        return Ok(());
    }

    let total = db.count_transactions(user_id)?;

    println!();
    println!("📝 Recent Transactions ({} total)", total);
    println!("   ─────────────────────────────────────────────────────────────");

    for stored in transactions {
        let tx = &stored.transaction;
        let amount_str = match tx.kind {
            TransactionKind::Expense => format!("\x1b[31m-{}\x1b[0m", format_brl(tx.amount)),
            TransactionKind::Income => format!("\x1b[32m+{}\x1b[0m", format_brl(tx.amount)),
        };

        let label = match stored.description.as_deref() {
            Some(desc) if !desc.is_empty() => format!("{} ({})", tx.category, desc),
            _ => tx.category.clone(),
        };

        println!(
            "   [{}] {} │ {:>16} │ {}",
            stored.id,
            tx.date,
            amount_str,
            truncate(&label, 40)
        );
    }

    Ok(())
}
