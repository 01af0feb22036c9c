//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use chrono::NaiveDate;
use prumo_core::advisor::{Advisor, Horizon, Narrative, SavingsStatus};
use prumo_core::db::Database;
use prumo_core::models::{Intent, RiskProfile, Transaction};
use prumo_core::profile::Allocation;
use prumo_core::{IntentClassifier, Lexicon};

use crate::commands::{self, format_pct, truncate, Output};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const STATEMENT: &str = "data,tipo,categoria,valor,descricao
05/03/2024,receita,Salário,\"5.000,00\",Empresa
10/03/2024,despesa,Aluguel,\"1.500,00\",
15/03/2024,despesa,Mercado,\"800,00\",
05/04/2024,receita,Salário,\"5.000,00\",Empresa
10/04/2024,despesa,Aluguel,\"1.500,00\",
15/04/2024,despesa,Mercado,\"850,00\",
";

// ========== Core Command Tests ==========

#[test]
fn test_open_db_unencrypted_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prumo.db");

    let db = commands::open_db(&path, true).unwrap();
    assert_eq!(db.count_transactions(1).unwrap(), 0);
    assert!(path.exists());
    assert!(!db.is_encrypted());
}

#[test]
fn test_cmd_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("init.db");
    assert!(commands::cmd_init(&path, true).is_ok());
}

#[test]
fn test_resolve_as_of_prefers_explicit_then_latest() {
    let db = Database::in_memory().unwrap();
    db.add_transaction(1, &Transaction::expense("Mercado", 10.0, d(2024, 3, 9)), None)
        .unwrap();

    let explicit = commands::resolve_as_of(&db, 1, Some("01/02/2024")).unwrap();
    assert_eq!(explicit, d(2024, 2, 1));

    let latest = commands::resolve_as_of(&db, 1, None).unwrap();
    assert_eq!(latest, d(2024, 3, 9));

    assert!(commands::resolve_as_of(&db, 1, Some("ontem")).is_err());
}

// ========== Import Command Tests ==========

#[test]
fn test_cmd_import_and_reimport() {
    let db = Database::in_memory().unwrap();
    let file = write_csv(STATEMENT);

    commands::cmd_import(&db, 1, file.path()).unwrap();
    assert_eq!(db.count_transactions(1).unwrap(), 6);

    // Second run only finds duplicates
    commands::cmd_import(&db, 1, file.path()).unwrap();
    assert_eq!(db.count_transactions(1).unwrap(), 6);
}

#[test]
fn test_cmd_import_missing_file() {
    let db = Database::in_memory().unwrap();
    let result = commands::cmd_import(&db, 1, std::path::Path::new("/nonexistent/extrato.csv"));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to open file"));
}

#[test]
fn test_cmd_import_bad_row_reports_context() {
    let db = Database::in_memory().unwrap();
    let file = write_csv("date,type,category,amount\n2024-01-01,expense,Mercado,abc\n");

    let err = commands::cmd_import(&db, 1, file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse CSV"));
    assert_eq!(db.count_transactions(1).unwrap(), 0);
}

#[test]
fn test_cmd_add() {
    let db = Database::in_memory().unwrap();
    commands::cmd_add(&db, 1, "despesa", "Farmácia", "45,90", Some("2024-05-02"), Some("remédio"))
        .unwrap();

    let listed = db.list_transactions(1, 10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        listed[0].transaction,
        Transaction::expense("Farmácia", 45.9, d(2024, 5, 2))
    );
    assert_eq!(listed[0].description.as_deref(), Some("remédio"));
}

#[test]
fn test_cmd_add_rejects_bad_input() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_add(&db, 1, "gift", "Mercado", "10", None, None).is_err());
    assert!(commands::cmd_add(&db, 1, "expense", "  ", "10", None, None).is_err());
    assert!(commands::cmd_add(&db, 1, "expense", "Mercado", "-10", None, None).is_err());
    assert!(commands::cmd_add(&db, 1, "expense", "Mercado", "dez", None, None).is_err());
    assert_eq!(db.count_transactions(1).unwrap(), 0);
}

// ========== Ask Command Tests ==========

#[test]
fn test_cmd_ask_updates_profile_and_log() {
    let db = Database::in_memory().unwrap();
    let file = write_csv(STATEMENT);
    commands::cmd_import(&db, 1, file.path()).unwrap();

    commands::cmd_ask(&db, 1, "como posso economizar mais?", None, Output::Text).unwrap();
    commands::cmd_ask(&db, 1, "o que é CDB?", None, Output::Json).unwrap();

    let profile = db.get_profile(1).unwrap().unwrap();
    assert_eq!(profile.interaction_count, 2);
    assert_eq!(profile.version, 2);
    assert_eq!(profile.focus_counters.get(&Intent::Savings), Some(&1));

    let log = db.list_interactions(1, 10).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].question, "o que é CDB?");
    assert!(log[0].response.contains("CDB"));
    assert!(log[1].intents.contains(&Intent::Savings));
}

#[test]
fn test_ask_json_reports_the_stored_profile() {
    let db = Database::in_memory().unwrap();
    let profile = db.get_or_create_profile(1).unwrap();
    let advisor = Advisor::new(IntentClassifier::new(Lexicon::embedded().unwrap()).unwrap());
    let consultation = advisor.consult("como investir", &[], &profile, d(2024, 3, 31));

    // Another writer changes the profile before this interaction is saved
    db.set_risk_profile(1, RiskProfile::Aggressive).unwrap();
    let saved = db
        .apply_interaction(1, &consultation.intents, consultation.current_balance())
        .unwrap();
    assert_eq!(consultation.updated_profile.risk_profile, RiskProfile::Moderate);

    let output = commands::AskOutput::new("resposta", &consultation, &saved);
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["profile"]["risk_profile"], "aggressive");
    assert_eq!(json["profile"]["version"], saved.version);
    assert_eq!(json["profile"]["interaction_count"], 1);
    assert!(json["consultation"].get("updated_profile").is_none());
}

#[test]
fn test_cmd_ask_without_history() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_ask(&db, 5, "oi", Some("2024-01-31"), Output::Text).is_ok());
    assert_eq!(db.list_interactions(5, 10).unwrap().len(), 1);
}

#[test]
fn test_cmd_history() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_history(&db, 1, 10, Output::Text).is_ok());

    db.record_interaction(1, "como investir?", &[Intent::Investment], "plano")
        .unwrap();
    assert!(commands::cmd_history(&db, 1, 10, Output::Text).is_ok());
    assert!(commands::cmd_history(&db, 1, 10, Output::Json).is_ok());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_report() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_report(&db, 1, 12, 3, Output::Text).is_ok());

    let file = write_csv(STATEMENT);
    commands::cmd_import(&db, 1, file.path()).unwrap();
    assert!(commands::cmd_report(&db, 1, 12, 3, Output::Text).is_ok());
    assert!(commands::cmd_report(&db, 1, 6, 0, Output::Json).is_ok());
}

// ========== Profile Command Tests ==========

#[test]
fn test_cmd_profile_set_risk() {
    let db = Database::in_memory().unwrap();
    commands::cmd_profile_set_risk(&db, 1, "arrojado").unwrap();
    assert_eq!(
        db.get_profile(1).unwrap().unwrap().risk_profile,
        RiskProfile::Aggressive
    );

    let err = commands::cmd_profile_set_risk(&db, 1, "yolo").unwrap_err();
    assert!(err.to_string().contains("conservative, moderate, aggressive"));
    assert!(commands::cmd_profile_show(&db, 1, Output::Text).is_ok());
}

#[test]
fn test_cmd_allocate() {
    let db = Database::in_memory().unwrap();
    assert!(commands::cmd_allocate(&db, 1, "1.000,00", Output::Text).is_ok());
    assert!(commands::cmd_allocate(&db, 1, "500", Output::Json).is_ok());
    assert!(commands::cmd_allocate(&db, 1, "muito", Output::Text).is_err());
}

// ========== Rendering Tests ==========

#[test]
fn test_render_investment_plan() {
    let narrative = Narrative::InvestmentPlan {
        risk_profile: RiskProfile::Conservative,
        base_amount: 1000.0,
        horizon_months: 36,
        horizon: Horizon::Long,
        allocation: Allocation {
            liquidity: 700.0,
            short_term: 200.0,
            diversified: 80.0,
            opportunistic: 20.0,
        },
    };

    let lines = commands::render_narrative(&narrative);
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("R$ 1.000,00"));
    assert!(lines[0].contains("longo prazo"));
    assert!(lines[0].contains("Conservador"));
    assert!(lines[1].contains("R$ 700,00"));
}

#[test]
fn test_render_savings_deficit() {
    let narrative = Narrative::SavingsPlan {
        status: SavingsStatus::Deficit,
        savings_rate: -10.0,
        balance: -500.0,
        monthly_target: 1000.0,
        top_expense: Some("Aluguel".into()),
    };

    let lines = commands::render_narrative(&narrative);
    assert!(lines[0].contains("-R$ 500,00"));
    assert!(lines.last().unwrap().contains("Aluguel"));
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long string", 10), "this is...");
    // Multi-byte characters count once
    assert_eq!(truncate("educação financeira", 10), "educaçã...");
}

#[test]
fn test_format_pct() {
    assert_eq!(format_pct(12.5), "12,5%");
    assert_eq!(format_pct(-3.0), "-3,0%");
}
