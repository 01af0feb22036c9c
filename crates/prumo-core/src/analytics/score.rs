//! Composite financial health score

use serde::Serialize;

/// Qualitative grade for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Grade {
    pub fn from_points(points: u32) -> Self {
        match points {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsImprovement => "needs_improvement",
        }
    }

    /// pt-BR label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excelente",
            Self::Good => "Bom",
            Self::Fair => "Regular",
            Self::NeedsImprovement => "Precisa melhorar",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a score factor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    SavingsRate,
    IncomeStability,
    ExpenseStability,
    IncomeDiversification,
    IncomeExpenseCorrelation,
}

/// One contribution to the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreFactor {
    pub kind: FactorKind,
    /// Measured value the band was picked from
    pub value: f64,
    pub points: u32,
    pub max_points: u32,
}

/// Inputs the score is computed from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreInputs {
    /// Percent of current income left after expenses
    pub savings_rate: f64,
    pub income_volatility: f64,
    pub expense_volatility: f64,
    /// Distinct income categories in the current month divided by 3
    pub diversification: f64,
    pub correlation: f64,
    pub low_confidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialScore {
    /// 0..=100
    pub points: u32,
    pub grade: Grade,
    pub factors: Vec<ScoreFactor>,
    pub low_confidence: bool,
}

fn savings_points(rate: f64) -> u32 {
    if rate >= 20.0 {
        25
    } else if rate >= 10.0 {
        15
    } else if rate >= 0.0 {
        5
    } else {
        0
    }
}

fn stability_points(volatility: f64) -> u32 {
    if volatility < 0.2 {
        20
    } else if volatility < 0.4 {
        10
    } else {
        0
    }
}

fn diversification_points(ratio: f64) -> u32 {
    if ratio >= 0.7 {
        15
    } else if ratio >= 0.3 {
        10
    } else {
        0
    }
}

fn correlation_points(correlation: f64) -> u32 {
    if correlation < 0.5 {
        20
    } else if correlation < 0.8 {
        10
    } else {
        0
    }
}

impl FinancialScore {
    pub fn compute(inputs: &ScoreInputs) -> Self {
        let factors = vec![
            ScoreFactor {
                kind: FactorKind::SavingsRate,
                value: inputs.savings_rate,
                points: savings_points(inputs.savings_rate),
                max_points: 25,
            },
            ScoreFactor {
                kind: FactorKind::IncomeStability,
                value: inputs.income_volatility,
                points: stability_points(inputs.income_volatility),
                max_points: 20,
            },
            ScoreFactor {
                kind: FactorKind::ExpenseStability,
                value: inputs.expense_volatility,
                points: stability_points(inputs.expense_volatility),
                max_points: 20,
            },
            ScoreFactor {
                kind: FactorKind::IncomeDiversification,
                value: inputs.diversification,
                points: diversification_points(inputs.diversification),
                max_points: 15,
            },
            ScoreFactor {
                kind: FactorKind::IncomeExpenseCorrelation,
                value: inputs.correlation,
                points: correlation_points(inputs.correlation),
                max_points: 20,
            },
        ];

        let points = factors.iter().map(|f| f.points).sum::<u32>().min(100);

        Self {
            points,
            grade: Grade::from_points(points),
            factors,
            low_confidence: inputs.low_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_score() {
        let score = FinancialScore::compute(&ScoreInputs {
            savings_rate: 30.0,
            income_volatility: 0.05,
            expense_volatility: 0.1,
            diversification: 1.0,
            correlation: 0.1,
            low_confidence: false,
        });
        assert_eq!(score.points, 100);
        assert_eq!(score.grade, Grade::Excellent);
        assert_eq!(score.factors.len(), 5);
    }

    #[test]
    fn test_band_edges() {
        let score = FinancialScore::compute(&ScoreInputs {
            savings_rate: 10.0,
            income_volatility: 0.2,
            expense_volatility: 0.4,
            diversification: 0.3,
            correlation: 0.8,
            low_confidence: true,
        });
        // 15 + 10 + 0 + 10 + 0
        assert_eq!(score.points, 35);
        assert_eq!(score.grade, Grade::NeedsImprovement);
        assert!(score.low_confidence);
    }

    #[test]
    fn test_negative_savings_rate_scores_zero() {
        assert_eq!(savings_points(-5.0), 0);
        assert_eq!(savings_points(0.0), 5);
    }

    #[test]
    fn test_grades() {
        assert_eq!(Grade::from_points(80), Grade::Excellent);
        assert_eq!(Grade::from_points(79), Grade::Good);
        assert_eq!(Grade::from_points(60), Grade::Good);
        assert_eq!(Grade::from_points(40), Grade::Fair);
        assert_eq!(Grade::from_points(39), Grade::NeedsImprovement);
        assert_eq!(Grade::Fair.label(), "Regular");
    }
}
