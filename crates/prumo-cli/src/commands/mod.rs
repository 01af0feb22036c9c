//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init) and shared utilities (open_db)
//! - `import` - CSV import and manual entry
//! - `ask` - Questions to the advisor and the interaction history
//! - `reports` - Score, trend and alert report
//! - `profile` - Adaptive profile and investment allocation
//! - `transactions` - Transaction listing

pub mod ask;
pub mod core;
pub mod import;
pub mod profile;
pub mod reports;
pub mod transactions;

// Re-export command functions for main.rs
pub use ask::*;
pub use core::*;
pub use import::*;
pub use profile::*;
pub use reports::*;
pub use transactions::*;

use anyhow::Result;
use serde::Serialize;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

/// Pretty-print `value` as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Percentage with one decimal and a comma separator, e.g. `12,5%`
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value).replace('.', ",")
}
