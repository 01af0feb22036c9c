//! Monthly aggregation of transaction history

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::{Transaction, TransactionKind};

/// Category used when a transaction has none
pub const UNCATEGORIZED: &str = "outros";

/// Calendar month, ordered by year then month, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Month `n` months earlier
    pub fn minus_months(&self, n: u32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Income and expense totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    pub month: MonthKey,
    pub income: f64,
    pub expense: f64,
    pub expense_by_category: BTreeMap<String, f64>,
    pub income_by_category: BTreeMap<String, f64>,
    pub transaction_count: usize,
}

impl MonthlyAggregate {
    pub fn empty(month: MonthKey) -> Self {
        Self {
            month,
            income: 0.0,
            expense: 0.0,
            expense_by_category: BTreeMap::new(),
            income_by_category: BTreeMap::new(),
            transaction_count: 0,
        }
    }

    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }

    /// Mean absolute transaction value in the month
    pub fn average_transaction(&self) -> f64 {
        if self.transaction_count == 0 {
            return 0.0;
        }
        (self.income + self.expense) / self.transaction_count as f64
    }

    /// Balance as a percentage of income (0 without income)
    pub fn savings_rate(&self) -> f64 {
        if self.income > 0.0 {
            self.balance() / self.income * 100.0
        } else {
            0.0
        }
    }

    /// Expense as a percentage of income (0 without income)
    pub fn expense_ratio(&self) -> f64 {
        if self.income > 0.0 {
            self.expense / self.income * 100.0
        } else {
            0.0
        }
    }

    fn add(&mut self, tx: &Transaction) {
        let category = match tx.category.trim() {
            "" => UNCATEGORIZED.to_string(),
            c => c.to_string(),
        };
        match tx.kind {
            TransactionKind::Income => {
                self.income += tx.amount;
                *self.income_by_category.entry(category).or_insert(0.0) += tx.amount;
            }
            TransactionKind::Expense => {
                self.expense += tx.amount;
                *self.expense_by_category.entry(category).or_insert(0.0) += tx.amount;
            }
        }
        self.transaction_count += 1;
    }
}

/// Inclusive date range for aggregation (open ends are unbounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Window {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// The `n` calendar months ending with the month of `as_of`, up to `as_of` itself
    pub fn trailing_months(as_of: NaiveDate, n: u32) -> Self {
        let first = MonthKey::from_date(as_of).minus_months(n.max(1) - 1);
        Self {
            start: first.first_day(),
            end: Some(as_of),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Group transactions inside `window` into ascending calendar months
pub fn aggregate(transactions: &[Transaction], window: &Window) -> Vec<MonthlyAggregate> {
    let mut months: BTreeMap<MonthKey, MonthlyAggregate> = BTreeMap::new();

    for tx in transactions.iter().filter(|tx| window.contains(tx.date)) {
        let key = MonthKey::from_date(tx.date);
        months
            .entry(key)
            .or_insert_with(|| MonthlyAggregate::empty(key))
            .add(tx);
    }

    months.into_values().collect()
}
