//! Domain models for Prumo

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "receita" | "entrada" => Ok(Self::Income),
            "expense" | "despesa" | "saida" | "saída" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as the analytics engine sees it
///
/// `amount` is always a non-negative magnitude; the direction lives in `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn new(kind: TransactionKind, category: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self {
            kind,
            category: category.into(),
            amount: amount.abs(),
            date,
        }
    }

    pub fn income(category: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, category, amount, date)
    }

    pub fn expense(category: impl Into<String>, amount: f64, date: NaiveDate) -> Self {
        Self::new(TransactionKind::Expense, category, amount, date)
    }

    /// Signed amount: positive for income, negative for expenses
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// A transaction stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub transaction: Transaction,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A transaction ready to insert (from CSV import or manual entry)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction: Transaction,
    pub description: Option<String>,
    /// SHA-256 of the row contents, used to skip duplicate imports
    pub import_hash: String,
}

/// Financial topic inferred from a question
///
/// Declaration order matters: it breaks ties between equally scored intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Savings,
    Investment,
    Debt,
    Income,
    Expense,
    Planning,
    Budget,
    EmergencyFund,
    Retirement,
    RealEstate,
    Education,
    Insurance,
    Tax,
    Travel,
    Vehicle,
    Business,
    CreditCard,
    Loan,
    Crypto,
    Forex,
    Help,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "savings",
            Self::Investment => "investment",
            Self::Debt => "debt",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Planning => "planning",
            Self::Budget => "budget",
            Self::EmergencyFund => "emergency_fund",
            Self::Retirement => "retirement",
            Self::RealEstate => "real_estate",
            Self::Education => "education",
            Self::Insurance => "insurance",
            Self::Tax => "tax",
            Self::Travel => "travel",
            Self::Vehicle => "vehicle",
            Self::Business => "business",
            Self::CreditCard => "credit_card",
            Self::Loan => "loan",
            Self::Crypto => "crypto",
            Self::Forex => "forex",
            Self::Help => "help",
        }
    }

    /// Human-readable pt-BR label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Savings => "Poupança",
            Self::Investment => "Investimento",
            Self::Debt => "Dívidas",
            Self::Income => "Renda",
            Self::Expense => "Gastos",
            Self::Planning => "Planejamento",
            Self::Budget => "Orçamento",
            Self::EmergencyFund => "Reserva de emergência",
            Self::Retirement => "Aposentadoria",
            Self::RealEstate => "Imóvel",
            Self::Education => "Educação",
            Self::Insurance => "Seguro",
            Self::Tax => "Impostos",
            Self::Travel => "Viagem",
            Self::Vehicle => "Veículo",
            Self::Business => "Negócio próprio",
            Self::CreditCard => "Cartão de crédito",
            Self::Loan => "Empréstimo",
            Self::Crypto => "Criptoativos",
            Self::Forex => "Câmbio",
            Self::Help => "Ajuda",
        }
    }

    /// Get all intents in declaration order
    pub fn all() -> &'static [Intent] {
        &[
            Self::Savings,
            Self::Investment,
            Self::Debt,
            Self::Income,
            Self::Expense,
            Self::Planning,
            Self::Budget,
            Self::EmergencyFund,
            Self::Retirement,
            Self::RealEstate,
            Self::Education,
            Self::Insurance,
            Self::Tax,
            Self::Travel,
            Self::Vehicle,
            Self::Business,
            Self::CreditCard,
            Self::Loan,
            Self::Crypto,
            Self::Forex,
            Self::Help,
        ]
    }

    /// Position in declaration order
    pub fn ordinal(&self) -> usize {
        *self as usize
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Intent::all()
            .iter()
            .copied()
            .find(|intent| intent.as_str() == key)
            .ok_or_else(|| format!("Unknown intent: {}", s))
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Investor risk appetite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Conservative => "Conservador",
            Self::Moderate => "Moderado",
            Self::Aggressive => "Arrojado",
        }
    }

    /// Parse a stored or user-supplied value, falling back to moderate
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::str::FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" | "conservador" => Ok(Self::Conservative),
            "moderate" | "moderado" => Ok(Self::Moderate),
            "aggressive" | "arrojado" | "agressivo" => Ok(Self::Aggressive),
            _ => Err(format!("Unknown risk profile: {}", s)),
        }
    }
}

impl std::fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bound for the savings target ratchet
pub const SAVINGS_TARGET_CAP: u8 = 25;

/// Default savings target for a new profile
pub const DEFAULT_SAVINGS_TARGET_PCT: u8 = 20;

/// Default emergency fund size (months of expenses) for a new profile
pub const DEFAULT_EMERGENCY_MONTHS: u32 = 3;

/// Per-user adaptive profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub user_id: i64,
    pub risk_profile: RiskProfile,
    /// Never above [`SAVINGS_TARGET_CAP`]
    pub savings_target_pct: u8,
    pub emergency_months_target: u32,
    pub focus_counters: BTreeMap<Intent, u32>,
    pub interaction_count: u64,
    pub last_updated: DateTime<Utc>,
    /// Bumped on every successful save
    pub version: i64,
}

impl FinancialProfile {
    /// A fresh profile with default targets
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            risk_profile: RiskProfile::default(),
            savings_target_pct: DEFAULT_SAVINGS_TARGET_PCT,
            emergency_months_target: DEFAULT_EMERGENCY_MONTHS,
            focus_counters: BTreeMap::new(),
            interaction_count: 0,
            last_updated: Utc::now(),
            version: 0,
        }
    }

    /// Most frequently asked-about intent, if any
    pub fn top_focus(&self) -> Option<Intent> {
        self.focus_counters
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(intent, _)| *intent)
    }
}

/// Audit record of one question and its answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub user_id: i64,
    pub question: String,
    pub intents: Vec<Intent>,
    pub response: String,
    pub created_at: DateTime<Utc>,
}
