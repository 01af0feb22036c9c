//! Budget, spending-cut and emergency-fund plans derived from analytics

use serde::Serialize;

use super::aggregate::MonthlyAggregate;
use super::engine::{AnalyticsResult, CurrentPeriod};
use crate::lexicon::BudgetKeywords;
use crate::models::FinancialProfile;

/// Share of unclassified spend counted as needs
const UNCLASSIFIED_NEEDS_SHARE: f64 = 0.7;

/// Months of history averaged for the emergency fund target
const EMERGENCY_LOOKBACK_MONTHS: usize = 6;

/// 50/30/20 targets against actual spend for the current month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSplit {
    pub target_needs: f64,
    pub target_wants: f64,
    pub target_savings: f64,
    pub actual_needs: f64,
    pub actual_wants: f64,
    pub actual_savings: f64,
}

pub fn budget_split(current: &CurrentPeriod, keywords: &BudgetKeywords) -> BudgetSplit {
    let mut needs = 0.0;
    let mut wants = 0.0;

    for (category, amount) in &current.expense_by_category {
        if keywords.is_need(category) {
            needs += amount;
        } else if keywords.is_want(category) {
            wants += amount;
        } else {
            needs += amount * UNCLASSIFIED_NEEDS_SHARE;
            wants += amount * (1.0 - UNCLASSIFIED_NEEDS_SHARE);
        }
    }

    BudgetSplit {
        target_needs: current.income * 0.50,
        target_wants: current.income * 0.30,
        target_savings: current.income * 0.20,
        actual_needs: needs,
        actual_wants: wants,
        actual_savings: current.balance.max(0.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutItem {
    pub category: String,
    pub current: f64,
    pub cut_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCut {
    pub category: String,
    pub amount: f64,
}

/// Suggested cuts on the biggest expense categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutPlan {
    /// Fraction cut from every listed category
    pub cut_pct: f64,
    pub items: Vec<CutItem>,
    /// A quarter of the monthly cut on the biggest category
    pub weekly: Option<WeeklyCut>,
}

/// Cut intensity for the current savings situation
pub fn cut_percentage(savings_rate: f64, balance: f64) -> f64 {
    if savings_rate < 5.0 || balance < 0.0 {
        0.30
    } else if savings_rate < 10.0 {
        0.20
    } else {
        0.15
    }
}

pub fn cut_plan(current: &CurrentPeriod, top_n: usize) -> CutPlan {
    let cut_pct = cut_percentage(current.savings_rate, current.balance);

    let items: Vec<CutItem> = current
        .top_expenses(top_n)
        .into_iter()
        .map(|(category, amount)| CutItem {
            category,
            current: amount,
            cut_value: amount * cut_pct,
        })
        .collect();

    let weekly = items.first().map(|top| WeeklyCut {
        category: top.category.clone(),
        amount: top.cut_value / 4.0,
    });

    CutPlan {
        cut_pct,
        items,
        weekly,
    }
}

/// Target and pace for building an emergency fund
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmergencyPlan {
    pub average_monthly_expense: f64,
    pub buffer_months: u32,
    pub target: f64,
    pub monthly_contribution: f64,
    /// `None` when the target or the contribution is zero
    pub months_to_reach: Option<u32>,
}

pub fn emergency_plan(
    aggregates: &[MonthlyAggregate],
    current: &CurrentPeriod,
    expense_volatility: f64,
    profile: &FinancialProfile,
) -> EmergencyPlan {
    let average_monthly_expense = if aggregates.is_empty() {
        current.expense
    } else {
        let recent = &aggregates[aggregates.len().saturating_sub(EMERGENCY_LOOKBACK_MONTHS)..];
        recent.iter().map(|m| m.expense).sum::<f64>() / recent.len() as f64
    };

    let risky = expense_volatility > 0.3 || current.balance < 0.0;
    let buffer_months = if risky { 6 } else { 3 }.max(profile.emergency_months_target);
    let target = average_monthly_expense * buffer_months as f64;

    let surplus = current.balance.max(0.0);
    let monthly_contribution = (current.income * 0.15)
        .max(surplus * 0.6)
        .min(current.income * 0.25);

    let months_to_reach = if target > 0.0 && monthly_contribution > 0.0 {
        Some((target / monthly_contribution).ceil() as u32)
    } else {
        None
    };

    EmergencyPlan {
        average_monthly_expense,
        buffer_months,
        target,
        monthly_contribution,
        months_to_reach,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    NegativeBalance,
    LowSavings,
    VolatileIncome,
    VolatileExpenses,
    HighCorrelation,
}

impl AlertKind {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            Self::NegativeBalance => AlertSeverity::Critical,
            _ => AlertSeverity::Warning,
        }
    }

    /// pt-BR description
    pub fn message(&self) -> &'static str {
        match self {
            Self::NegativeBalance => "Saldo negativo no mês: ação imediata necessária",
            Self::LowSavings => "Poupança abaixo de 10% da renda",
            Self::VolatileIncome => "Renda muito volátil: diversifique as fontes",
            Self::VolatileExpenses => "Gastos muito voláteis: reforce o controle",
            Self::HighCorrelation => "Gastos acompanham a renda de perto",
        }
    }
}

/// Warning signs in the analytics, most severe first
pub fn alerts(analytics: &AnalyticsResult) -> Vec<AlertKind> {
    if analytics.months == 0 {
        return Vec::new();
    }

    let mut found = Vec::new();
    if analytics.current.balance < 0.0 {
        found.push(AlertKind::NegativeBalance);
    }
    if analytics.current.savings_rate < 10.0 {
        found.push(AlertKind::LowSavings);
    }
    if analytics.volatility.income > 0.4 {
        found.push(AlertKind::VolatileIncome);
    }
    if analytics.volatility.expense > 0.4 {
        found.push(AlertKind::VolatileExpenses);
    }
    if analytics.correlation.coefficient > 0.8 {
        found.push(AlertKind::HighCorrelation);
    }
    found
}
