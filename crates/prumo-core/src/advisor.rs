//! Question-to-narrative pipeline
//!
//! The advisor ties the engine together: it classifies a question, extracts
//! its entities, looks up glossary terms, runs analytics over the trailing
//! months of history and picks one structured [`Narrative`] for the answer.
//! It also returns the profile as it should look after the interaction;
//! persisting it is the caller's job (see `Database::apply_interaction`).
//!
//! Narratives carry figures, not prose. Rendering them is left to the
//! caller.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analytics::{
    aggregate, alerts, analyze, budget_split, cut_plan, emergency_plan, AlertKind,
    AnalyticsConfig, AnalyticsResult, BudgetSplit, CutPlan, EmergencyPlan, Window,
};
use crate::classifier::{IntentClassifier, Tone};
use crate::entities::{self, ExtractedEntities};
use crate::error::Result;
use crate::glossary::{self, GlossaryEntry};
use crate::models::{FinancialProfile, Intent, RiskProfile, Transaction, TransactionKind};
use crate::profile::{allocate, update_on_interaction, Allocation};
use crate::text::normalize;

/// Months of history analyzed per question
pub const DEFAULT_HISTORY_MONTHS: u32 = 12;

/// Investment horizon used when the question names none
pub const DEFAULT_HORIZON_MONTHS: u32 = 18;

/// Savings rate (percent) below which investing waits for a cushion
const INVESTMENT_READY_RATE: f64 = 15.0;

/// Share of income suggested for investing when no amount is given
const INVESTMENT_INCOME_SHARE: f64 = 0.15;

/// Category stems that identify debt payments
const DEBT_CATEGORY_STEMS: &[&str] = &["cart", "emprest", "financi"];

/// Categories listed in a cut plan
const CUT_PLAN_CATEGORIES: usize = 5;

/// Investment horizon bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// Up to 6 months
    Short,
    /// Up to 24 months
    Medium,
    Long,
}

impl Horizon {
    pub fn from_months(months: u32) -> Self {
        match months {
            0..=6 => Self::Short,
            7..=24 => Self::Medium,
            _ => Self::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl std::fmt::Display for Horizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the current month's savings stand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsStatus {
    /// Spending exceeds income
    Deficit,
    /// Saving less than 20% of income
    Low,
    Healthy,
}

/// Rough room for income growth, by current income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPotential {
    High,
    Moderate,
    Stable,
}

impl GrowthPotential {
    pub fn for_income(income: f64) -> Self {
        if income < 5_000.0 {
            Self::High
        } else if income < 10_000.0 {
            Self::Moderate
        } else {
            Self::Stable
        }
    }
}

/// Discriminant of a [`Narrative`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeKind {
    Glossary,
    SavingsPlan,
    InvestmentPlan,
    InvestmentReadiness,
    DebtPayoff,
    IncomeGrowth,
    CutPlan,
    BudgetReview,
    EmergencyPlan,
    GoalPlan,
    Overview,
}

impl NarrativeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glossary => "glossary",
            Self::SavingsPlan => "savings_plan",
            Self::InvestmentPlan => "investment_plan",
            Self::InvestmentReadiness => "investment_readiness",
            Self::DebtPayoff => "debt_payoff",
            Self::IncomeGrowth => "income_growth",
            Self::CutPlan => "cut_plan",
            Self::BudgetReview => "budget_review",
            Self::EmergencyPlan => "emergency_plan",
            Self::GoalPlan => "goal_plan",
            Self::Overview => "overview",
        }
    }
}

impl std::fmt::Display for NarrativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The analytic story selected for a question, with the figures behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Narrative {
    Glossary {
        entries: Vec<GlossaryEntry>,
    },
    SavingsPlan {
        status: SavingsStatus,
        savings_rate: f64,
        balance: f64,
        /// Income times the profile's savings target
        monthly_target: f64,
        top_expense: Option<String>,
    },
    InvestmentPlan {
        risk_profile: RiskProfile,
        base_amount: f64,
        horizon_months: u32,
        horizon: Horizon,
        allocation: Allocation,
    },
    InvestmentReadiness {
        savings_rate: f64,
        /// Balance covers at least half a month of income
        cushion_ok: bool,
        monthly_goal: f64,
    },
    DebtPayoff {
        /// Debt-like expenses in the analyzed window
        total_debt: f64,
        /// 30% of the debt, the three-month payoff goal
        three_month_goal: f64,
        can_pay: bool,
        emotional: bool,
    },
    IncomeGrowth {
        income: f64,
        potential: GrowthPotential,
        /// Extra monthly income to aim for within six months
        six_month_target: f64,
    },
    CutPlan {
        plan: CutPlan,
        expense_ratio: f64,
        target_expense_ratio: f64,
        monthly_saving: f64,
    },
    BudgetReview {
        split: BudgetSplit,
    },
    EmergencyPlan {
        plan: EmergencyPlan,
        current_balance: f64,
    },
    GoalPlan {
        goal: Intent,
        horizon_months: u32,
        monthly_contribution: f64,
        projected_total: f64,
    },
    Overview {
        score: u32,
        top_focus: Option<Intent>,
        alerts: Vec<AlertKind>,
    },
}

impl Narrative {
    pub fn kind(&self) -> NarrativeKind {
        match self {
            Self::Glossary { .. } => NarrativeKind::Glossary,
            Self::SavingsPlan { .. } => NarrativeKind::SavingsPlan,
            Self::InvestmentPlan { .. } => NarrativeKind::InvestmentPlan,
            Self::InvestmentReadiness { .. } => NarrativeKind::InvestmentReadiness,
            Self::DebtPayoff { .. } => NarrativeKind::DebtPayoff,
            Self::IncomeGrowth { .. } => NarrativeKind::IncomeGrowth,
            Self::CutPlan { .. } => NarrativeKind::CutPlan,
            Self::BudgetReview { .. } => NarrativeKind::BudgetReview,
            Self::EmergencyPlan { .. } => NarrativeKind::EmergencyPlan,
            Self::GoalPlan { .. } => NarrativeKind::GoalPlan,
            Self::Overview { .. } => NarrativeKind::Overview,
        }
    }
}

/// Everything produced for one question
#[derive(Debug, Clone, Serialize)]
pub struct Consultation {
    pub intents: Vec<Intent>,
    pub tone: Tone,
    pub entities: ExtractedEntities,
    pub glossary_hits: Vec<GlossaryEntry>,
    pub analytics: AnalyticsResult,
    pub alerts: Vec<AlertKind>,
    pub narrative: Narrative,
    /// Profile after applying this interaction; not yet persisted
    #[serde(skip)]
    pub updated_profile: FinancialProfile,
}

impl Consultation {
    /// Balance of the latest analyzed month
    pub fn current_balance(&self) -> f64 {
        self.analytics.current.balance
    }
}

/// Runs the classification and analytics pipeline for a question
#[derive(Debug, Clone)]
pub struct Advisor {
    classifier: IntentClassifier,
    config: AnalyticsConfig,
    history_months: u32,
}

impl Advisor {
    pub fn new(classifier: IntentClassifier) -> Self {
        Self {
            classifier,
            config: AnalyticsConfig::default(),
            history_months: DEFAULT_HISTORY_MONTHS,
        }
    }

    /// Build an advisor over the default lexicon (with local override)
    pub fn load() -> Result<Self> {
        Ok(Self::new(IntentClassifier::load()?))
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_history_months(mut self, months: u32) -> Self {
        self.history_months = months.max(1);
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Answer `question` against `history` as of `as_of`
    pub fn consult(
        &self,
        question: &str,
        history: &[Transaction],
        profile: &FinancialProfile,
        as_of: NaiveDate,
    ) -> Consultation {
        let classification = self.classifier.classify_scored(question);
        let entities = entities::extract(question);
        let glossary_hits: Vec<GlossaryEntry> =
            glossary::find_terms(question).into_iter().copied().collect();

        let window = Window::trailing_months(as_of, self.history_months);
        let months = aggregate(history, &window);
        let analytics = analyze(&months, &self.config);
        let found_alerts = alerts(&analytics);

        let ctx = NarrativeContext {
            intents: &classification.intents,
            tone: classification.tone,
            entities: &entities,
            glossary_hits: &glossary_hits,
            analytics: &analytics,
            alerts: &found_alerts,
            profile,
            history,
            window: &window,
            months: &months,
            budget: &self.classifier.lexicon().budget,
        };
        let narrative = select_narrative(&ctx);

        let updated_profile =
            update_on_interaction(profile, &classification.intents, analytics.current.balance);

        debug!(
            intents = ?classification.intents,
            narrative = %narrative.kind(),
            months = analytics.months,
            "Consultation complete"
        );

        Consultation {
            intents: classification.intents,
            tone: classification.tone,
            entities,
            glossary_hits,
            analytics,
            alerts: found_alerts,
            narrative,
            updated_profile,
        }
    }
}

struct NarrativeContext<'a> {
    intents: &'a [Intent],
    tone: Tone,
    entities: &'a ExtractedEntities,
    glossary_hits: &'a [GlossaryEntry],
    analytics: &'a AnalyticsResult,
    alerts: &'a [AlertKind],
    profile: &'a FinancialProfile,
    history: &'a [Transaction],
    window: &'a Window,
    months: &'a [crate::analytics::MonthlyAggregate],
    budget: &'a crate::lexicon::BudgetKeywords,
}

impl NarrativeContext<'_> {
    fn has(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }

    fn has_any(&self, intents: &[Intent]) -> bool {
        intents.iter().any(|i| self.has(*i))
    }
}

/// Intents answered with a generic goal plan, in rule order
const GOAL_INTENTS: &[Intent] = &[
    Intent::Retirement,
    Intent::RealEstate,
    Intent::Education,
    Intent::Insurance,
    Intent::Tax,
    Intent::Travel,
    Intent::Vehicle,
    Intent::Business,
    Intent::Crypto,
    Intent::Forex,
];

/// Pick the narrative with a fixed rule order over the intent set
fn select_narrative(ctx: &NarrativeContext<'_>) -> Narrative {
    let current = &ctx.analytics.current;

    if !ctx.glossary_hits.is_empty() {
        return Narrative::Glossary {
            entries: ctx.glossary_hits.to_vec(),
        };
    }

    if ctx.has(Intent::Savings) {
        return savings_plan(ctx);
    }

    if ctx.has(Intent::Investment) {
        return investment_plan(ctx);
    }

    if ctx.has_any(&[Intent::Debt, Intent::CreditCard, Intent::Loan]) {
        return debt_payoff(ctx);
    }

    if ctx.has(Intent::Income) {
        return Narrative::IncomeGrowth {
            income: current.income,
            potential: GrowthPotential::for_income(current.income),
            six_month_target: current.income * 0.2,
        };
    }

    if ctx.has(Intent::Expense) {
        let plan = cut_plan(current, CUT_PLAN_CATEGORIES);
        let expense_ratio = current.expense_ratio;
        return Narrative::CutPlan {
            plan,
            expense_ratio,
            target_expense_ratio: expense_ratio * 0.8,
            monthly_saving: current.expense * 0.2,
        };
    }

    if ctx.has_any(&[Intent::Planning, Intent::Budget]) {
        return Narrative::BudgetReview {
            split: budget_split(current, ctx.budget),
        };
    }

    if ctx.has(Intent::EmergencyFund) {
        return Narrative::EmergencyPlan {
            plan: emergency_plan(
                ctx.months,
                current,
                ctx.analytics.volatility.expense,
                ctx.profile,
            ),
            current_balance: current.balance,
        };
    }

    if let Some(goal) = GOAL_INTENTS.iter().copied().find(|g| ctx.has(*g)) {
        let horizon_months = ctx
            .entities
            .first_horizon()
            .unwrap_or(DEFAULT_HORIZON_MONTHS)
            .max(1);
        let monthly_contribution =
            current.income.max(0.0) * f64::from(ctx.profile.savings_target_pct) / 100.0;
        return Narrative::GoalPlan {
            goal,
            horizon_months,
            monthly_contribution,
            projected_total: monthly_contribution * f64::from(horizon_months),
        };
    }

    Narrative::Overview {
        score: ctx.analytics.score.points,
        top_focus: ctx.profile.top_focus(),
        alerts: ctx.alerts.to_vec(),
    }
}

fn savings_plan(ctx: &NarrativeContext<'_>) -> Narrative {
    let current = &ctx.analytics.current;
    let status = if current.balance < 0.0 {
        SavingsStatus::Deficit
    } else if current.savings_rate < 20.0 {
        SavingsStatus::Low
    } else {
        SavingsStatus::Healthy
    };

    Narrative::SavingsPlan {
        status,
        savings_rate: current.savings_rate,
        balance: current.balance,
        monthly_target: current.income.max(0.0) * f64::from(ctx.profile.savings_target_pct)
            / 100.0,
        top_expense: current.top_expenses(1).into_iter().next().map(|(c, _)| c),
    }
}

fn investment_plan(ctx: &NarrativeContext<'_>) -> Narrative {
    let current = &ctx.analytics.current;
    let desired_pct = ctx.entities.first_percent();

    if current.savings_rate < INVESTMENT_READY_RATE
        && desired_pct.map_or(true, |p| p < INVESTMENT_READY_RATE)
    {
        return Narrative::InvestmentReadiness {
            savings_rate: current.savings_rate,
            cushion_ok: current.balance >= current.income * 0.5,
            monthly_goal: current.income.max(0.0) * INVESTMENT_INCOME_SHARE,
        };
    }

    let base_amount = match ctx.entities.first_amount() {
        Some(amount) if amount > 0.0 => amount,
        _ if current.balance > 0.0 => current.balance,
        _ => current.income.max(0.0) * INVESTMENT_INCOME_SHARE,
    };
    let horizon_months = ctx
        .entities
        .first_horizon()
        .unwrap_or(DEFAULT_HORIZON_MONTHS)
        .max(1);

    Narrative::InvestmentPlan {
        risk_profile: ctx.profile.risk_profile,
        base_amount,
        horizon_months,
        horizon: Horizon::from_months(horizon_months),
        allocation: allocate(ctx.profile, base_amount),
    }
}

fn debt_payoff(ctx: &NarrativeContext<'_>) -> Narrative {
    let total_debt: f64 = ctx
        .history
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense && ctx.window.contains(tx.date))
        .filter(|tx| {
            let category = normalize(&tx.category);
            DEBT_CATEGORY_STEMS.iter().any(|stem| category.contains(stem))
        })
        .map(|tx| tx.amount)
        .sum();

    let three_month_goal = total_debt * 0.3;
    Narrative::DebtPayoff {
        total_debt,
        three_month_goal,
        can_pay: ctx.analytics.current.balance > three_month_goal,
        emotional: matches!(ctx.tone, Tone::Urgent | Tone::Supportive),
    }
}
