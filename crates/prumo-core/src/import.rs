//! CSV import of transaction history
//!
//! Expected header: `date,type,category,amount[,description]`. Portuguese
//! column names (`data,tipo,categoria,valor,descricao`) are accepted too,
//! in any order.
//!
//! - Dates: `YYYY-MM-DD` or `DD/MM/YYYY`
//! - Type: `income|receita|expense|despesa`. When the column is empty the
//!   sign of the amount decides: negative is an expense.
//! - Amounts: pt-BR (`1.234,56`, `R$ 2 mil`) or plain (`1234.56`)
//!
//! Every row gets a SHA-256 hash so re-importing the same file is a no-op.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::entities::parse_amount_token;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionKind};
use crate::text::normalize;

/// Resolved column positions for one file
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    kind: Option<usize>,
    category: usize,
    amount: usize,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&normalize(h).as_str()))
        };

        let required = |names: &[&str]| {
            find(names).ok_or_else(|| {
                Error::Import(format!("Missing column '{}' in CSV header", names[0]))
            })
        };

        Ok(Self {
            date: required(&["date", "data"])?,
            kind: find(&["type", "tipo"]),
            category: required(&["category", "categoria"])?,
            amount: required(&["amount", "valor"])?,
            description: find(&["description", "descricao"]),
        })
    }
}

/// Parse a transaction CSV
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut transactions = Vec::new();
    // Identical rows inside one file are distinct transactions
    let mut seen: HashMap<String, u32> = HashMap::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = index + 2;

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let field = |pos: usize, name: &str| {
            record
                .get(pos)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Import(format!("Line {}: missing {}", line, name)))
        };

        let raw_date = field(columns.date, "date")?;
        let date = parse_date(raw_date).map_err(|_| {
            Error::Import(format!("Line {}: unable to parse date '{}'", line, raw_date))
        })?;
        let raw_amount = field(columns.amount, "amount")?;
        let signed = parse_amount(raw_amount).map_err(|_| {
            Error::Import(format!("Line {}: unable to parse amount '{}'", line, raw_amount))
        })?;

        let kind = match columns.kind.and_then(|pos| record.get(pos)).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse::<TransactionKind>()
                .map_err(|e| Error::Import(format!("Line {}: {}", line, e)))?,
            None if signed < 0.0 => TransactionKind::Expense,
            None => TransactionKind::Income,
        };

        let category = field(columns.category, "category")?.to_string();
        let description = columns
            .description
            .and_then(|pos| record.get(pos))
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let transaction = Transaction::new(kind, category, signed, date);
        let base_hash = generate_hash(&transaction, description.as_deref(), 0);
        let occurrence = seen.entry(base_hash.clone()).or_insert(0);
        let import_hash = if *occurrence == 0 {
            base_hash
        } else {
            generate_hash(&transaction, description.as_deref(), *occurrence)
        };
        *occurrence += 1;

        transactions.push(NewTransaction {
            transaction,
            description,
            import_hash,
        });
    }

    debug!("Parsed {} transactions from CSV", transactions.len());
    Ok(transactions)
}

/// Hash for deduplication
///
/// `occurrence` separates repeated identical rows within one file.
pub fn generate_hash(tx: &Transaction, description: Option<&str>, occurrence: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tx.date.to_string().as_bytes());
    hasher.update(tx.kind.as_str().as_bytes());
    hasher.update(normalize(&tx.category).as_bytes());
    hasher.update(tx.amount.to_be_bytes());
    if let Some(desc) = description {
        hasher.update(desc.as_bytes());
    }
    if occurrence > 0 {
        hasher.update(occurrence.to_be_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Parse `YYYY-MM-DD` or `DD/MM/YYYY`
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse a signed amount in pt-BR or plain decimal notation
///
/// A single `.` followed by one or two digits and no `,` is read as a
/// decimal point; otherwise `.` groups thousands.
pub fn parse_amount(s: &str) -> Result<f64> {
    let trimmed = s.trim();
    let (negative, body) = if let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        (true, inner)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (true, rest)
    } else {
        (false, trimmed)
    };

    let plain_decimal = !body.contains(',')
        && body.matches('.').count() == 1
        && body
            .rsplit('.')
            .next()
            .is_some_and(|frac| (1..=2).contains(&frac.len()) && frac.chars().all(|c| c.is_ascii_digit()));

    let value = if plain_decimal {
        body.trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse::<f64>()
            .ok()
    } else {
        parse_amount_token(body)
    };

    value
        .map(|v| if negative { -v } else { v })
        .ok_or_else(|| Error::Import(format!("Unable to parse amount: {}", s)))
}
