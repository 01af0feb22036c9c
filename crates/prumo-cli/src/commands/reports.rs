//! Report command implementation

use anyhow::{Context, Result};
use prumo_core::{
    analytics::{
        aggregate, alerts, analyze, month_name, AlertKind, AlertSeverity, AnalyticsConfig,
        AnalyticsResult, Projection, Window,
    },
    db::Database,
    text::format_brl,
};
use serde::Serialize;

use super::{format_pct, print_json, resolve_as_of, Output};

/// Categories listed under "top expenses"
const TOP_EXPENSES: usize = 5;

#[derive(Serialize)]
struct ReportOutput<'a> {
    analytics: &'a AnalyticsResult,
    alerts: &'a [AlertKind],
    projection: Option<Projection>,
}

pub fn cmd_report(
    db: &Database,
    user_id: i64,
    months: u32,
    ahead: u32,
    output: Output,
) -> Result<()> {
    let as_of = resolve_as_of(db, user_id, None)?;
    let window = Window::trailing_months(as_of, months.max(1));
    let history = db
        .transactions_in(user_id, &window)
        .context("Failed to load transaction history")?;

    let aggregates = aggregate(&history, &window);
    let result = analyze(&aggregates, &AnalyticsConfig::default());
    let found = alerts(&result);
    let projection =
        (ahead > 0 && !result.trend.low_confidence).then(|| result.trend.project(ahead));

    if output == Output::Json {
        return print_json(&ReportOutput {
            analytics: &result,
            alerts: &found,
            projection,
        });
    }

    if result.months == 0 {
        println!("No transactions in the last {} months. Import some with:", months);
        println!("  prumo import --file extrato.csv");
        return Ok(());
    }

    println!();
    println!("📊 Relatório financeiro ({} meses)", result.months);
    println!("   ─────────────────────────────");
    println!(
        "   Pontuação: {}/100 ({})",
        result.score.points,
        result.score.grade.label()
    );

    let current = &result.current;
    if let Some(month) = current.month {
        println!("   Mês de referência: {} {}", month_name(month.month), month.year);
    }
    println!("   Renda:    {}", format_brl(current.income));
    println!("   Gastos:   {}", format_brl(current.expense));
    println!("   Saldo:    {}", format_brl(current.balance));
    println!("   Poupança: {}", format_pct(current.savings_rate));

    if let Some(mom) = &result.month_over_month {
        println!(
            "   Variação mensal: renda {}, gastos {}",
            format_pct(mom.income_change_pct),
            format_pct(mom.expense_change_pct)
        );
    }

    let top = current.top_expenses(TOP_EXPENSES);
    if !top.is_empty() {
        println!();
        println!("💸 Maiores gastos do mês");
        for (category, amount) in top {
            println!("   {:<24} {:>14}", category, format_brl(amount));
        }
    }

    let growing: Vec<_> = result.growing_categories().collect();
    if !growing.is_empty() {
        println!();
        println!("📈 Categorias em alta");
        for trend in growing {
            println!("   {:<24} +{}", trend.category, format_pct(trend.trend * 100.0));
        }
    }

    if !result.problem_categories.is_empty() {
        println!();
        println!("🚩 Categorias que pesam na renda");
        for problem in &result.problem_categories {
            println!("   {:<24} {:>14}", problem.category, format_brl(problem.total));
        }
    }

    let highs = &result.seasonal_highs;
    if !highs.high_expense_months.is_empty() {
        let names: Vec<&str> = highs.high_expense_months.iter().map(|m| month_name(*m)).collect();
        println!();
        println!("🗓️  Meses de gasto alto: {}", names.join(", "));
    }

    match projection {
        Some(p) => {
            println!();
            println!("🔮 Projeção para daqui a {} meses", p.months_ahead);
            println!(
                "   Renda {} │ Gastos {} │ Saldo {}",
                format_brl(p.income),
                format_brl(p.expense),
                format_brl(p.balance)
            );
        }
        None if ahead > 0 => {
            println!();
            println!("   💡 Histórico curto demais para projetar tendências.");
        }
        None => {}
    }

    if !found.is_empty() {
        println!();
        for alert in &found {
            let icon = match alert.severity() {
                AlertSeverity::Critical => "🔴",
                AlertSeverity::Warning => "🟡",
            };
            println!("{} {}", icon, alert.message());
        }
    }

    Ok(())
}
