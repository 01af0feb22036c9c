//! Predictive analytics over transaction history
//!
//! Transactions are bucketed into calendar months, then analyzed for trend,
//! volatility, income/expense correlation, category growth and seasonality.
//! A composite score and a set of plans (50/30/20 budget, spending cuts,
//! emergency fund) are derived from the result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use prumo_core::analytics::{aggregate, analyze, AnalyticsConfig, Window};
//!
//! let months = aggregate(&transactions, &Window::trailing_months(today, 12));
//! let result = analyze(&months, &AnalyticsConfig::default());
//! println!("score: {} ({})", result.score.points, result.score.grade);
//! ```

pub mod aggregate;
pub mod engine;
pub mod planning;
pub mod score;
pub mod stats;

pub use aggregate::{aggregate, MonthKey, MonthlyAggregate, Window};
pub use engine::{
    analyze, month_name, AnalyticsConfig, AnalyticsResult, CategoryTrend, Correlation,
    CurrentPeriod, MonthOverMonth, ProblemCategory, Projection, SeasonalHighs, TrendModel,
    Volatility,
};
pub use planning::{
    alerts, budget_split, cut_plan, emergency_plan, AlertKind, AlertSeverity, BudgetSplit,
    CutPlan, EmergencyPlan,
};
pub use score::{FactorKind, FinancialScore, Grade, ScoreFactor};
pub use stats::{linear_regression, pearson, volatility, LinearFit};
