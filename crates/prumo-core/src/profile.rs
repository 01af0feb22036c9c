//! Adaptive profile rules
//!
//! Pure transformations of a [`FinancialProfile`]. Persistence and
//! concurrency live in `db::profiles`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{FinancialProfile, Intent, RiskProfile, SAVINGS_TARGET_CAP};

/// Emergency fund size enforced once the user runs a negative balance
pub const NEGATIVE_BALANCE_EMERGENCY_MONTHS: u32 = 6;

/// Apply one interaction to a profile
pub fn update_on_interaction(
    profile: &FinancialProfile,
    intents: &[Intent],
    current_balance: f64,
) -> FinancialProfile {
    update_on_interaction_at(profile, intents, current_balance, Utc::now())
}

/// [`update_on_interaction`] with an explicit clock
///
/// Every intent in `intents` bumps its focus counter, so an intent listed
/// twice counts twice. Asking about savings raises the savings target by
/// one point up to the cap, once per interaction; a negative balance
/// raises the emergency target to at least six months. Neither target is
/// ever lowered here.
pub fn update_on_interaction_at(
    profile: &FinancialProfile,
    intents: &[Intent],
    current_balance: f64,
    now: DateTime<Utc>,
) -> FinancialProfile {
    let mut next = profile.clone();

    for intent in intents {
        let counter = next.focus_counters.entry(*intent).or_insert(0);
        *counter = counter.saturating_add(1);
    }

    if intents.contains(&Intent::Savings) && next.savings_target_pct < SAVINGS_TARGET_CAP {
        next.savings_target_pct += 1;
    }

    if current_balance < 0.0 {
        next.emergency_months_target = next
            .emergency_months_target
            .max(NEGATIVE_BALANCE_EMERGENCY_MONTHS);
    }

    next.interaction_count = next.interaction_count.saturating_add(1);
    next.last_updated = now;
    next
}

/// Split of an amount across four buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Allocation {
    /// Daily-liquidity reserve (Tesouro Selic, CDB with daily liquidity)
    pub liquidity: f64,
    /// 6 to 12 month fixed income
    pub short_term: f64,
    /// Funds and ETFs
    pub diversified: f64,
    /// Cash kept for opportunities
    pub opportunistic: f64,
}

impl Allocation {
    pub fn total(&self) -> f64 {
        self.liquidity + self.short_term + self.diversified + self.opportunistic
    }
}

/// Bucket weights (liquidity, short term, diversified, opportunistic) for a risk profile
pub fn weights(risk: RiskProfile) -> [f64; 4] {
    match risk {
        RiskProfile::Conservative => [0.70, 0.20, 0.08, 0.02],
        RiskProfile::Moderate => [0.60, 0.25, 0.10, 0.05],
        RiskProfile::Aggressive => [0.40, 0.20, 0.35, 0.05],
    }
}

/// Split `base_amount` by the profile's risk weights
///
/// Negative amounts allocate nothing.
pub fn allocate(profile: &FinancialProfile, base_amount: f64) -> Allocation {
    let base = base_amount.max(0.0);
    let [liquidity, short_term, diversified, opportunistic] = weights(profile.risk_profile);
    Allocation {
        liquidity: base * liquidity,
        short_term: base * short_term,
        diversified: base * diversified,
        opportunistic: base * opportunistic,
    }
}
