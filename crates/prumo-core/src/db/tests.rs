//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::Window;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use std::thread;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn imported(tx: Transaction, hash: &str) -> NewTransaction {
        NewTransaction {
            transaction: tx,
            description: None,
            import_hash: hash.to_string(),
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.count_transactions(1).unwrap(), 0);
        assert!(db.get_profile(1).unwrap().is_none());
    }

    #[test]
    fn test_encryption_follows_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cofre.db");
        let path = path.to_str().unwrap();

        let db = Database::new_with_key(path, Some("senha forte")).unwrap();
        assert!(db.is_encrypted());
        db.get_or_create_profile(1).unwrap();
        drop(db);

        // Without the key the file is unreadable
        assert!(Database::new_unencrypted(path).is_err());
        let reopened = Database::new_with_key(path, Some("senha forte")).unwrap();
        assert!(reopened.get_profile(1).unwrap().is_some());

        assert!(!Database::in_memory().unwrap().is_encrypted());
    }

    #[test]
    fn test_schema_has_version_column() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('ai_profiles') WHERE name IN ('user_id', 'focus_counters', 'version')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 3);
    }

    #[test]
    fn test_import_skips_duplicates_per_user() {
        let db = Database::in_memory().unwrap();
        let rows = vec![
            imported(Transaction::income("Salário", 5000.0, d(2024, 1, 5)), "h1"),
            imported(Transaction::expense("Aluguel", 1500.0, d(2024, 1, 10)), "h2"),
        ];

        let first = db.import_transactions(1, &rows).unwrap();
        assert_eq!(first, ImportSummary { inserted: 2, duplicates: 0 });

        let again = db.import_transactions(1, &rows).unwrap();
        assert_eq!(again, ImportSummary { inserted: 0, duplicates: 2 });

        // Same hashes belong to nobody else
        let other = db.import_transactions(2, &rows).unwrap();
        assert_eq!(other.inserted, 2);

        assert_eq!(db.insert_transaction(1, &rows[0]).unwrap(), None);
        assert_eq!(db.count_transactions(1).unwrap(), 2);
    }

    #[test]
    fn test_manual_entries_are_never_deduplicated() {
        let db = Database::in_memory().unwrap();
        let coffee = Transaction::expense("Café", 8.5, d(2024, 2, 1));
        db.add_transaction(1, &coffee, Some("padaria")).unwrap();
        db.add_transaction(1, &coffee, Some("padaria")).unwrap();

        let listed = db.list_transactions(1, 10).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].transaction, coffee);
        assert_eq!(listed[0].description.as_deref(), Some("padaria"));
    }

    #[test]
    fn test_transactions_in_window() {
        let db = Database::in_memory().unwrap();
        for (i, m) in [1, 2, 3, 4].into_iter().enumerate() {
            db.insert_transaction(
                1,
                &imported(Transaction::expense("Mercado", 100.0 * m as f64, d(2024, m, 15)), &format!("m{}", i)),
            )
            .unwrap();
        }

        let window = Window::between(d(2024, 2, 1), d(2024, 3, 31));
        let txs = db.transactions_in(1, &window).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].date, d(2024, 2, 15));
        assert_eq!(txs[1].amount, 300.0);

        assert_eq!(db.transactions_in(1, &Window::all()).unwrap().len(), 4);
        assert_eq!(db.latest_transaction_date(1).unwrap(), Some(d(2024, 4, 15)));
        assert_eq!(db.latest_transaction_date(9).unwrap(), None);
    }

    #[test]
    fn test_get_or_create_profile_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let first = db.get_or_create_profile(42).unwrap();
        let second = db.get_or_create_profile(42).unwrap();

        assert_eq!(first.user_id, 42);
        assert_eq!(first.risk_profile, RiskProfile::Moderate);
        assert_eq!(first.savings_target_pct, DEFAULT_SAVINGS_TARGET_PCT);
        assert_eq!(first.emergency_months_target, DEFAULT_EMERGENCY_MONTHS);
        assert_eq!(first.version, 0);
        assert_eq!(second.version, 0);
        assert!(second.focus_counters.is_empty());
    }

    #[test]
    fn test_save_profile_detects_stale_version() {
        let db = Database::in_memory().unwrap();
        let loaded = db.get_or_create_profile(1).unwrap();

        let mut first = loaded.clone();
        first.savings_target_pct = 21;
        let saved = db.save_profile(&first).unwrap();
        assert_eq!(saved.version, 1);

        // A writer still holding version 0 loses
        let mut stale = loaded;
        stale.savings_target_pct = 22;
        let err = db.save_profile(&stale).unwrap_err();
        assert!(matches!(err, Error::ProfileConflict { expected_version: 0, .. }));
        assert!(err.is_retryable());

        assert_eq!(db.get_profile(1).unwrap().unwrap().savings_target_pct, 21);
    }

    #[test]
    fn test_apply_interaction_persists_counters() {
        let db = Database::in_memory().unwrap();
        db.apply_interaction(1, &[Intent::Savings, Intent::Investment], 100.0)
            .unwrap();
        let profile = db.apply_interaction(1, &[Intent::Savings], -50.0).unwrap();

        assert_eq!(profile.version, 2);
        assert_eq!(profile.interaction_count, 2);
        assert_eq!(profile.savings_target_pct, 22);
        assert_eq!(profile.emergency_months_target, 6);

        let stored = db.get_profile(1).unwrap().unwrap();
        assert_eq!(stored.focus_counters.get(&Intent::Savings), Some(&2));
        assert_eq!(stored.focus_counters.get(&Intent::Investment), Some(&1));
        assert_eq!(stored.version, 2);
    }

    #[test]
    fn test_unknown_stored_intents_are_dropped() {
        let db = Database::in_memory().unwrap();
        db.get_or_create_profile(1).unwrap();
        db.conn()
            .unwrap()
            .execute(
                r#"UPDATE ai_profiles SET focus_counters = '{"savings": 3, "lottery": 9}', risk_profile = 'yolo' WHERE user_id = 1"#,
                [],
            )
            .unwrap();

        let profile = db.get_profile(1).unwrap().unwrap();
        assert_eq!(profile.focus_counters.len(), 1);
        assert_eq!(profile.focus_counters.get(&Intent::Savings), Some(&3));
        assert_eq!(profile.risk_profile, RiskProfile::Moderate);
    }

    #[test]
    fn test_set_risk_profile() {
        let db = Database::in_memory().unwrap();
        let profile = db.set_risk_profile(3, RiskProfile::Aggressive).unwrap();
        assert_eq!(profile.risk_profile, RiskProfile::Aggressive);
        assert_eq!(profile.version, 1);
        assert_eq!(
            db.get_profile(3).unwrap().unwrap().risk_profile,
            RiskProfile::Aggressive
        );
    }

    #[test]
    fn test_concurrent_interactions_lose_no_updates() {
        let db = Arc::new(Database::in_memory().unwrap());
        let threads = 8;
        let per_thread = 10;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        db.apply_interaction(7, &[Intent::Savings], 10.0).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let profile = db.get_profile(7).unwrap().unwrap();
        let total = (threads * per_thread) as u64;
        assert_eq!(profile.interaction_count, total);
        assert_eq!(profile.focus_counters.get(&Intent::Savings), Some(&(total as u32)));
        assert_eq!(profile.version, total as i64);
        assert_eq!(profile.savings_target_pct, SAVINGS_TARGET_CAP);
    }

    #[test]
    fn test_interaction_log() {
        let db = Database::in_memory().unwrap();
        db.record_interaction(1, "como investir?", &[Intent::Investment], "plano")
            .unwrap();
        db.record_interaction(1, "tô no vermelho", &[Intent::Debt, Intent::Help], "calma")
            .unwrap();
        db.record_interaction(2, "outra pessoa", &[Intent::Help], "oi")
            .unwrap();

        let log = db.list_interactions(1, 10).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].question, "tô no vermelho");
        assert_eq!(log[0].intents, vec![Intent::Debt, Intent::Help]);
        assert_eq!(log[1].intents, vec![Intent::Investment]);

        assert_eq!(db.list_interactions(1, 1).unwrap().len(), 1);
    }
}
