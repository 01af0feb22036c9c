//! Adaptive profile persistence
//!
//! Every write is guarded by the `version` column: an update only lands if
//! the row still carries the version that was read. `apply_interaction`
//! additionally runs its read-modify-write inside one `IMMEDIATE`
//! transaction, so concurrent updates for the same user serialize on the
//! SQLite write lock instead of overwriting each other.

use std::collections::BTreeMap;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, warn};

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{FinancialProfile, Intent, RiskProfile, SAVINGS_TARGET_CAP};
use crate::profile::update_on_interaction;

/// Attempts made by `apply_interaction` before a retryable error is returned
pub const MAX_PROFILE_ATTEMPTS: u32 = 5;

/// Base pause between attempts, multiplied by the attempt number
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Columns as stored, before conversion
struct ProfileRow {
    user_id: i64,
    risk_profile: String,
    savings_target_pct: i64,
    emergency_months_target: i64,
    focus_counters: String,
    interaction_count: i64,
    last_updated: Option<String>,
    version: i64,
}

impl ProfileRow {
    fn into_profile(self) -> Result<FinancialProfile> {
        // Unknown intents (from an older lexicon) are dropped
        let raw: BTreeMap<String, u32> = serde_json::from_str(&self.focus_counters)?;
        let focus_counters = raw
            .into_iter()
            .filter_map(|(name, count)| name.parse::<Intent>().ok().map(|i| (i, count)))
            .collect();

        Ok(FinancialProfile {
            user_id: self.user_id,
            risk_profile: RiskProfile::parse_lenient(&self.risk_profile),
            savings_target_pct: self.savings_target_pct.clamp(0, i64::from(SAVINGS_TARGET_CAP)) as u8,
            emergency_months_target: self.emergency_months_target.clamp(0, i64::from(u32::MAX)) as u32,
            focus_counters,
            interaction_count: self.interaction_count.max(0) as u64,
            last_updated: self
                .last_updated
                .as_deref()
                .map(parse_datetime)
                .unwrap_or_else(chrono::Utc::now),
            version: self.version,
        })
    }
}

fn ensure_profile(conn: &Connection, user_id: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO ai_profiles (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING",
        params![user_id],
    )?;
    Ok(())
}

fn read_profile(conn: &Connection, user_id: i64) -> Result<Option<FinancialProfile>> {
    let row = conn
        .query_row(
            r#"
            SELECT user_id, risk_profile, savings_target_pct, emergency_months_target,
                   focus_counters, interaction_count, last_updated, version
            FROM ai_profiles
            WHERE user_id = ?
            "#,
            params![user_id],
            |row| {
                Ok(ProfileRow {
                    user_id: row.get(0)?,
                    risk_profile: row.get(1)?,
                    savings_target_pct: row.get(2)?,
                    emergency_months_target: row.get(3)?,
                    focus_counters: row.get(4)?,
                    interaction_count: row.get(5)?,
                    last_updated: row.get(6)?,
                    version: row.get(7)?,
                })
            },
        )
        .optional()?;

    row.map(ProfileRow::into_profile).transpose()
}

/// Conditional write; returns the profile with its new version
fn write_profile(conn: &Connection, profile: &FinancialProfile) -> Result<FinancialProfile> {
    let counters: BTreeMap<&str, u32> = profile
        .focus_counters
        .iter()
        .map(|(intent, count)| (intent.as_str(), *count))
        .collect();

    let changed = conn.execute(
        r#"
        UPDATE ai_profiles
        SET risk_profile = ?, savings_target_pct = ?, emergency_months_target = ?,
            focus_counters = ?, interaction_count = ?, last_updated = ?, version = version + 1
        WHERE user_id = ? AND version = ?
        "#,
        params![
            profile.risk_profile.as_str(),
            profile.savings_target_pct.min(SAVINGS_TARGET_CAP),
            profile.emergency_months_target,
            serde_json::to_string(&counters)?,
            i64::try_from(profile.interaction_count).unwrap_or(i64::MAX),
            format_datetime(&profile.last_updated),
            profile.user_id,
            profile.version,
        ],
    )?;

    if changed == 0 {
        return Err(Error::ProfileConflict {
            user_id: profile.user_id,
            expected_version: profile.version,
        });
    }

    let mut saved = profile.clone();
    saved.version += 1;
    Ok(saved)
}

impl Database {
    /// Load the user's profile, creating it with defaults on first use
    pub fn get_or_create_profile(&self, user_id: i64) -> Result<FinancialProfile> {
        let conn = self.conn()?;
        ensure_profile(&conn, user_id)?;
        read_profile(&conn, user_id)?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))
    }

    /// Load the user's profile without creating it
    pub fn get_profile(&self, user_id: i64) -> Result<Option<FinancialProfile>> {
        let conn = self.conn()?;
        read_profile(&conn, user_id)
    }

    /// Persist `profile` if nobody else wrote it since it was read
    ///
    /// Fails with [`Error::ProfileConflict`] when the stored version moved on.
    pub fn save_profile(&self, profile: &FinancialProfile) -> Result<FinancialProfile> {
        let conn = self.conn()?;
        write_profile(&conn, profile)
    }

    /// Read, update and save the profile for one interaction atomically
    ///
    /// Retries busy and conflict errors up to [`MAX_PROFILE_ATTEMPTS`] times.
    pub fn apply_interaction(
        &self,
        user_id: i64,
        intents: &[Intent],
        current_balance: f64,
    ) -> Result<FinancialProfile> {
        let mut attempt = 1;
        loop {
            match self.try_apply_interaction(user_id, intents, current_balance) {
                Ok(profile) => return Ok(profile),
                Err(e) if e.is_retryable() && attempt < MAX_PROFILE_ATTEMPTS => {
                    warn!(user_id, attempt, error = %e, "Retrying profile update");
                    std::thread::sleep(RETRY_BACKOFF * attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_apply_interaction(
        &self,
        user_id: i64,
        intents: &[Intent],
        current_balance: f64,
    ) -> Result<FinancialProfile> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_profile(&tx, user_id)?;
        let current = read_profile(&tx, user_id)?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))?;
        let next = update_on_interaction(&current, intents, current_balance);
        let saved = write_profile(&tx, &next)?;

        tx.commit()?;
        debug!(user_id, version = saved.version, "Profile updated");
        Ok(saved)
    }

    /// Change the user's risk profile
    pub fn set_risk_profile(&self, user_id: i64, risk: RiskProfile) -> Result<FinancialProfile> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_profile(&tx, user_id)?;
        let mut profile = read_profile(&tx, user_id)?
            .ok_or_else(|| Error::NotFound(format!("profile for user {}", user_id)))?;
        profile.risk_profile = risk;
        profile.last_updated = chrono::Utc::now();
        let saved = write_profile(&tx, &profile)?;

        tx.commit()?;
        Ok(saved)
    }
}
