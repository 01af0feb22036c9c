//! Trend and risk analytics over monthly aggregates
//!
//! `analyze` never fails. Statistics that need more history than is
//! available fall back to zero and set `low_confidence`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::aggregate::{MonthKey, MonthlyAggregate};
use super::score::{FinancialScore, ScoreInputs};
use super::stats::{linear_regression, pearson, volatility, LinearFit};

/// Thresholds for the analytics engine
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Months needed before the trend line is trusted
    pub min_trend_points: usize,
    /// Category growth ratio above which a category is flagged as growing
    pub growth_threshold: f64,
    /// Fraction above the cross-month average that marks a seasonal high
    pub seasonal_margin: f64,
    /// Share of current income above which a category is a problem
    pub problem_share: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_trend_points: 3,
            growth_threshold: 0.20,
            seasonal_margin: 0.15,
            problem_share: 0.40,
        }
    }
}

/// Linear trend of income and expense against month index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendModel {
    pub income: LinearFit,
    pub expense: LinearFit,
    /// Number of months the model was fitted on
    pub points: usize,
    pub low_confidence: bool,
}

/// Projected figures for a future month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub months_ahead: u32,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

impl TrendModel {
    /// Project `months_ahead` months past the last fitted month
    ///
    /// Evaluates the fit at index `points + months_ahead - 1`.
    pub fn project(&self, months_ahead: u32) -> Projection {
        let x = (self.points as f64 + months_ahead as f64 - 1.0).max(0.0);
        let income = self.income.predict(x);
        let expense = self.expense.predict(x);
        Projection {
            months_ahead,
            income,
            expense,
            balance: income - expense,
        }
    }
}

/// Coefficient of variation of monthly income and expense
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Volatility {
    pub income: f64,
    pub expense: f64,
    pub low_confidence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    /// Pearson coefficient between monthly income and expense
    pub coefficient: f64,
    pub low_confidence: bool,
}

/// Early-versus-late growth of one expense category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    pub category: String,
    pub total: f64,
    /// (late - early) / early
    pub trend: f64,
    pub growing: bool,
}

/// Calendar months (1..=12) that run above average
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonalHighs {
    pub high_expense_months: Vec<u32>,
    pub high_income_months: Vec<u32>,
}

/// Figures for the latest month in the series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentPeriod {
    pub month: Option<MonthKey>,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
    pub savings_rate: f64,
    pub expense_ratio: f64,
    /// Distinct income categories
    pub income_sources: usize,
    pub expense_by_category: BTreeMap<String, f64>,
}

impl CurrentPeriod {
    fn from_aggregate(month: &MonthlyAggregate) -> Self {
        Self {
            month: Some(month.month),
            income: month.income,
            expense: month.expense,
            balance: month.balance(),
            savings_rate: month.savings_rate(),
            expense_ratio: month.expense_ratio(),
            income_sources: month.income_by_category.len(),
            expense_by_category: month.expense_by_category.clone(),
        }
    }

    /// Expense categories by spend, largest first
    pub fn top_expenses(&self, n: usize) -> Vec<(String, f64)> {
        let mut items: Vec<(String, f64)> = self
            .expense_by_category
            .iter()
            .map(|(c, v)| (c.clone(), *v))
            .collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items.truncate(n);
        items
    }
}

/// An expense category that takes too large a share of income
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemCategory {
    pub category: String,
    /// Spend across the whole series
    pub total: f64,
}

/// Percent change of the last month against the one before it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthOverMonth {
    pub income_change_pct: f64,
    pub expense_change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResult {
    pub months: usize,
    pub trend: TrendModel,
    pub volatility: Volatility,
    pub correlation: Correlation,
    pub category_trends: Vec<CategoryTrend>,
    pub seasonal_highs: SeasonalHighs,
    pub score: FinancialScore,
    pub current: CurrentPeriod,
    pub problem_categories: Vec<ProblemCategory>,
    pub month_over_month: Option<MonthOverMonth>,
    pub low_confidence: bool,
}

impl AnalyticsResult {
    pub fn growing_categories(&self) -> impl Iterator<Item = &CategoryTrend> {
        self.category_trends.iter().filter(|t| t.growing)
    }
}

/// Run every statistic over ascending monthly aggregates
pub fn analyze(aggregates: &[MonthlyAggregate], config: &AnalyticsConfig) -> AnalyticsResult {
    let incomes: Vec<f64> = aggregates.iter().map(|m| m.income).collect();
    let expenses: Vec<f64> = aggregates.iter().map(|m| m.expense).collect();
    let n = aggregates.len();

    let trend = fit_trend(&incomes, &expenses, config.min_trend_points);

    let income_vol = volatility(&incomes);
    let expense_vol = volatility(&expenses);
    let volatility = Volatility {
        income: income_vol.unwrap_or(0.0),
        expense: expense_vol.unwrap_or(0.0),
        low_confidence: income_vol.is_none() || expense_vol.is_none(),
    };

    let coefficient = pearson(&incomes, &expenses);
    let correlation = Correlation {
        coefficient: coefficient.unwrap_or(0.0),
        low_confidence: coefficient.is_none(),
    };

    let current = aggregates
        .last()
        .map(CurrentPeriod::from_aggregate)
        .unwrap_or_default();

    let low_confidence = trend.low_confidence || volatility.low_confidence || correlation.low_confidence;

    let score = FinancialScore::compute(&ScoreInputs {
        savings_rate: current.savings_rate,
        income_volatility: volatility.income,
        expense_volatility: volatility.expense,
        diversification: current.income_sources as f64 / 3.0,
        correlation: correlation.coefficient,
        low_confidence,
    });

    let result = AnalyticsResult {
        months: n,
        category_trends: category_trends(aggregates, config.growth_threshold),
        seasonal_highs: seasonal_highs(aggregates, config.seasonal_margin),
        problem_categories: problem_categories(aggregates, current.income, config.problem_share),
        month_over_month: month_over_month(aggregates),
        trend,
        volatility,
        correlation,
        score,
        current,
        low_confidence,
    };

    debug!(
        months = n,
        score = result.score.points,
        low_confidence,
        "Analyzed monthly aggregates"
    );

    result
}

fn fit_trend(incomes: &[f64], expenses: &[f64], min_points: usize) -> TrendModel {
    let points = incomes.len();
    if points < min_points.max(2) {
        return TrendModel {
            income: LinearFit::default(),
            expense: LinearFit::default(),
            points,
            low_confidence: true,
        };
    }

    TrendModel {
        income: linear_regression(incomes).unwrap_or_default(),
        expense: linear_regression(expenses).unwrap_or_default(),
        points,
        low_confidence: false,
    }
}

fn category_trends(aggregates: &[MonthlyAggregate], threshold: f64) -> Vec<CategoryTrend> {
    let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for month in aggregates {
        for (category, amount) in &month.expense_by_category {
            series.entry(category.as_str()).or_default().push(*amount);
        }
    }

    let mut trends: Vec<CategoryTrend> = series
        .into_iter()
        .map(|(category, amounts)| {
            let total: f64 = amounts.iter().sum();
            let trend = if amounts.len() < 2 {
                0.0
            } else {
                // An odd middle month belongs to the late half
                let half = amounts.len() / 2;
                let early: f64 = amounts[..half].iter().sum();
                let late: f64 = amounts[half..].iter().sum();
                if early > 0.0 {
                    (late - early) / early
                } else {
                    0.0
                }
            };
            CategoryTrend {
                category: category.to_string(),
                total,
                trend,
                growing: trend > threshold,
            }
        })
        .collect();

    trends.sort_by(|a, b| b.trend.total_cmp(&a.trend).then_with(|| a.category.cmp(&b.category)));
    trends
}

fn seasonal_highs(aggregates: &[MonthlyAggregate], margin: f64) -> SeasonalHighs {
    // month of year -> (income, expense)
    let mut folded: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    for month in aggregates {
        let entry = folded.entry(month.month.month).or_insert((0.0, 0.0));
        entry.0 += month.income;
        entry.1 += month.expense;
    }
    if folded.is_empty() {
        return SeasonalHighs::default();
    }

    let count = folded.len() as f64;
    let avg_income = folded.values().map(|v| v.0).sum::<f64>() / count;
    let avg_expense = folded.values().map(|v| v.1).sum::<f64>() / count;

    SeasonalHighs {
        high_expense_months: folded
            .iter()
            .filter(|(_, v)| v.1 > avg_expense * (1.0 + margin))
            .map(|(m, _)| *m)
            .collect(),
        high_income_months: folded
            .iter()
            .filter(|(_, v)| v.0 > avg_income * (1.0 + margin))
            .map(|(m, _)| *m)
            .collect(),
    }
}

fn problem_categories(
    aggregates: &[MonthlyAggregate],
    current_income: f64,
    share: f64,
) -> Vec<ProblemCategory> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for month in aggregates {
        for (category, amount) in &month.expense_by_category {
            *totals.entry(category.as_str()).or_insert(0.0) += amount;
        }
    }

    let limit = current_income * share;
    let mut problems: Vec<ProblemCategory> = totals
        .into_iter()
        .filter(|(_, total)| *total > limit)
        .map(|(category, total)| ProblemCategory {
            category: category.to_string(),
            total,
        })
        .collect();
    problems.sort_by(|a, b| b.total.total_cmp(&a.total));
    problems
}

fn month_over_month(aggregates: &[MonthlyAggregate]) -> Option<MonthOverMonth> {
    let [.., prev, last] = aggregates else {
        return None;
    };
    let change = |now: f64, before: f64| (now - before) / before.max(1.0) * 100.0;
    Some(MonthOverMonth {
        income_change_pct: change(last.income, prev.income),
        expense_change_pct: change(last.expense, prev.expense),
    })
}

/// pt-BR month name for 1..=12
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
        "Outubro", "Novembro", "Dezembro",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::aggregate::{aggregate, Window};
    use crate::analytics::score::Grade;
    use crate::models::Transaction;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn month(y: i32, m: u32, income: f64, expense: f64) -> MonthlyAggregate {
        let mut agg = MonthlyAggregate::empty(MonthKey::new(y, m));
        agg.income = income;
        agg.expense = expense;
        if income > 0.0 {
            agg.income_by_category.insert("Salário".into(), income);
        }
        if expense > 0.0 {
            agg.expense_by_category.insert("Mercado".into(), expense);
        }
        agg
    }

    #[test]
    fn test_analyze_empty_is_degenerate() {
        let result = analyze(&[], &AnalyticsConfig::default());
        assert_eq!(result.months, 0);
        assert!(result.low_confidence);
        assert!(result.trend.low_confidence);
        assert_eq!(result.trend.income, LinearFit::default());
        assert_eq!(result.volatility.income, 0.0);
        assert_eq!(result.correlation.coefficient, 0.0);
        assert!(result.category_trends.is_empty());
        assert!(result.month_over_month.is_none());
        assert_eq!(result.current.month, None);
        assert!(result.score.low_confidence);
    }

    #[test]
    fn test_two_months_has_no_trend() {
        let months = vec![month(2024, 1, 1000.0, 500.0), month(2024, 2, 1500.0, 600.0)];
        let result = analyze(&months, &AnalyticsConfig::default());
        assert!(result.trend.low_confidence);
        assert_eq!(result.trend.income.slope, 0.0);
        assert!(!result.volatility.low_confidence);
        assert!(result.low_confidence);
    }

    #[test]
    fn test_trend_and_projection() {
        let months = vec![
            month(2024, 1, 5000.0, 3000.0),
            month(2024, 2, 5100.0, 3200.0),
            month(2024, 3, 5200.0, 3400.0),
        ];
        let result = analyze(&months, &AnalyticsConfig::default());
        assert!(!result.trend.low_confidence);
        assert!((result.trend.income.slope - 100.0).abs() < 1e-9);
        assert!((result.trend.expense.slope - 200.0).abs() < 1e-9);

        // index 3 + 3 - 1 = 5
        let p = result.trend.project(3);
        assert!((p.income - 5500.0).abs() < 1e-9);
        assert!((p.expense - 4000.0).abs() < 1e-9);
        assert!((p.balance - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_current_period_is_latest_month() {
        let months = vec![month(2024, 1, 4000.0, 1000.0), month(2024, 2, 5000.0, 4000.0)];
        let result = analyze(&months, &AnalyticsConfig::default());
        assert_eq!(result.current.month, Some(MonthKey::new(2024, 2)));
        assert_eq!(result.current.balance, 1000.0);
        assert!((result.current.savings_rate - 20.0).abs() < 1e-9);
        assert!((result.current.expense_ratio - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_month_over_month_floors_divisor() {
        let months = vec![month(2024, 1, 0.0, 100.0), month(2024, 2, 500.0, 150.0)];
        let mom = analyze(&months, &AnalyticsConfig::default())
            .month_over_month
            .unwrap();
        assert!((mom.income_change_pct - 50_000.0).abs() < 1e-9);
        assert!((mom.expense_change_pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_trends_and_problems() {
        let txs = vec![
            Transaction::income("Salário", 3000.0, d(2024, 1, 5)),
            Transaction::expense("Delivery", 100.0, d(2024, 1, 10)),
            Transaction::expense("Aluguel", 1500.0, d(2024, 1, 10)),
            Transaction::income("Salário", 3000.0, d(2024, 2, 5)),
            Transaction::expense("Delivery", 100.0, d(2024, 2, 10)),
            Transaction::expense("Aluguel", 1500.0, d(2024, 2, 10)),
            Transaction::income("Salário", 3000.0, d(2024, 3, 5)),
            Transaction::expense("Delivery", 300.0, d(2024, 3, 10)),
            Transaction::expense("Aluguel", 1500.0, d(2024, 3, 10)),
            Transaction::expense("Presentes", 50.0, d(2024, 3, 12)),
        ];
        let months = aggregate(&txs, &Window::all());
        let result = analyze(&months, &AnalyticsConfig::default());

        // Delivery: early [100], late [100, 300]
        let delivery = result
            .category_trends
            .iter()
            .find(|t| t.category == "Delivery")
            .unwrap();
        assert!((delivery.trend - 3.0).abs() < 1e-9);
        assert!(delivery.growing);
        assert_eq!(result.category_trends[0].category, "Delivery");

        let presentes = result
            .category_trends
            .iter()
            .find(|t| t.category == "Presentes")
            .unwrap();
        assert_eq!(presentes.trend, 0.0);
        assert!(!presentes.growing);

        // Aluguel totals 4500 against 40% of 3000
        let problems: Vec<_> = result.problem_categories.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(problems, vec!["Aluguel"]);
        assert_eq!(result.growing_categories().count(), 1);
    }

    #[test]
    fn test_odd_series_middle_month_is_late() {
        let txs = vec![
            Transaction::expense("Delivery", 100.0, d(2024, 1, 10)),
            Transaction::expense("Delivery", 150.0, d(2024, 2, 10)),
            Transaction::expense("Delivery", 110.0, d(2024, 3, 10)),
        ];
        let months = aggregate(&txs, &Window::all());
        let result = analyze(&months, &AnalyticsConfig::default());

        // early [100], late [150, 110]
        let delivery = &result.category_trends[0];
        assert!((delivery.trend - 1.6).abs() < 1e-9);
        assert!(delivery.growing);
    }

    #[test]
    fn test_seasonal_highs() {
        let months = vec![
            month(2023, 11, 5000.0, 3000.0),
            month(2023, 12, 9000.0, 6000.0),
            month(2024, 1, 5000.0, 3000.0),
            month(2024, 2, 5000.0, 3000.0),
        ];
        let highs = analyze(&months, &AnalyticsConfig::default()).seasonal_highs;
        assert_eq!(highs.high_expense_months, vec![12]);
        assert_eq!(highs.high_income_months, vec![12]);
        assert_eq!(month_name(12), "Dezembro");
        assert_eq!(month_name(0), "?");
    }

    #[test]
    fn test_stable_household_scores_well() {
        let months: Vec<_> = (1..=6)
            .map(|m| {
                let mut agg = month(2024, m, 10_000.0, 8500.0 + m as f64 * 10.0);
                agg.income_by_category.insert("Aluguel recebido".into(), 500.0);
                agg.income_by_category.insert("Dividendos".into(), 200.0);
                agg
            })
            .collect();
        let result = analyze(&months, &AnalyticsConfig::default());
        assert!(!result.low_confidence);
        // savings 15 + stable income 20 + stable expense 20 + 3 sources 15 + zero-variance income 20
        assert_eq!(result.score.points, 90);
        assert_eq!(result.score.grade, Grade::Excellent);
    }
}
