//! Prumo Core Library
//!
//! Shared functionality for the Prumo finance assistant:
//! - pt-BR text normalization and entity extraction (amounts, percents, horizons)
//! - Lexicon-driven intent classification with tone detection
//! - Glossary of Brazilian investment terms
//! - Monthly aggregation, trend/risk analytics and a composite score
//! - Budget, spending-cut and emergency-fund planning
//! - Adaptive per-user profiles with optimistic concurrency
//! - The advisor pipeline tying the above together
//! - Database access, migrations and CSV import

pub mod advisor;
pub mod analytics;
pub mod classifier;
pub mod db;
pub mod entities;
pub mod error;
pub mod glossary;
pub mod import;
pub mod lexicon;
pub mod models;
pub mod profile;
pub mod text;

pub use advisor::{Advisor, Consultation, Narrative, NarrativeKind};
pub use analytics::{AnalyticsConfig, AnalyticsResult, MonthKey, MonthlyAggregate, Window};
pub use classifier::{Classification, IntentClassifier, Tone};
pub use db::{Database, ImportSummary};
pub use entities::ExtractedEntities;
pub use error::{Error, Result};
pub use lexicon::Lexicon;
pub use models::{
    FinancialProfile, Intent, Interaction, NewTransaction, RiskProfile, StoredTransaction,
    Transaction, TransactionKind,
};
pub use profile::Allocation;
