//! Advisor command implementations
//!
//! `cmd_ask` runs one question through the advisor, persists the profile
//! update and logs the exchange. The rendering below turns a [`Narrative`]
//! into the pt-BR text shown to the user.

use anyhow::{Context, Result};
use prumo_core::{
    advisor::{
        Advisor, Consultation, GrowthPotential, Horizon, Narrative, SavingsStatus,
        DEFAULT_HISTORY_MONTHS,
    },
    analytics::Window,
    classifier::Tone,
    db::Database,
    models::FinancialProfile,
    text::format_brl,
};
use serde::Serialize;
use tracing::info;

use super::{format_pct, print_json, resolve_as_of, truncate, Output};

/// JSON shape of `prumo ask --json`
#[derive(Serialize)]
pub struct AskOutput<'a> {
    answer: &'a str,
    consultation: &'a Consultation,
    /// Profile as stored after this interaction
    profile: &'a FinancialProfile,
}

impl<'a> AskOutput<'a> {
    pub fn new(
        answer: &'a str,
        consultation: &'a Consultation,
        profile: &'a FinancialProfile,
    ) -> Self {
        Self {
            answer,
            consultation,
            profile,
        }
    }
}

pub fn cmd_ask(
    db: &Database,
    user_id: i64,
    question: &str,
    as_of: Option<&str>,
    output: Output,
) -> Result<()> {
    let as_of = resolve_as_of(db, user_id, as_of)?;
    let history = db
        .transactions_in(user_id, &Window::trailing_months(as_of, DEFAULT_HISTORY_MONTHS))
        .context("Failed to load transaction history")?;
    let profile = db
        .get_or_create_profile(user_id)
        .context("Failed to load profile")?;

    let advisor = Advisor::load().context("Failed to load lexicon")?;
    let consultation = advisor.consult(question, &history, &profile, as_of);
    let answer = render_answer(&consultation).join("\n");

    let saved = db
        .apply_interaction(user_id, &consultation.intents, consultation.current_balance())
        .context("Failed to update profile")?;
    db.record_interaction(user_id, question, &consultation.intents, &answer)
        .context("Failed to record interaction")?;

    info!(
        user_id,
        narrative = %consultation.narrative.kind(),
        profile_version = saved.version,
        "Question answered"
    );

    match output {
        Output::Json => print_json(&AskOutput::new(&answer, &consultation, &saved)),
        Output::Text => {
            println!();
            println!("{}", answer);
            if consultation.analytics.low_confidence {
                println!();
                println!("   💡 Poucos meses de histórico: os números são aproximados.");
            }
            Ok(())
        }
    }
}

pub fn cmd_history(db: &Database, user_id: i64, limit: i64, output: Output) -> Result<()> {
    let interactions = db.list_interactions(user_id, limit)?;

    if output == Output::Json {
        return print_json(&interactions);
    }

    if interactions.is_empty() {
        println!("No questions yet. Try:");
        println!("  prumo ask \"como posso economizar?\"");
        return Ok(());
    }

    println!();
    println!("💬 Recent Questions");
    println!("   ─────────────────────────────────────────────────────────────");

    for interaction in interactions {
        let intents: Vec<&str> = interaction.intents.iter().map(|i| i.as_str()).collect();
        println!(
            "   {} │ {} │ {}",
            interaction.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&interaction.question, 40),
            intents.join(", ")
        );
    }

    Ok(())
}

/// Full pt-BR answer: tone opener, narrative, then alerts
pub fn render_answer(consultation: &Consultation) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(opener) = tone_opener(consultation.tone) {
        lines.push(opener.to_string());
    }
    lines.extend(render_narrative(&consultation.narrative));

    // Overview already lists the alerts
    if !matches!(consultation.narrative, Narrative::Overview { .. }) {
        for alert in &consultation.alerts {
            lines.push(format!("⚠️  {}", alert.message()));
        }
    }
    lines
}

fn tone_opener(tone: Tone) -> Option<&'static str> {
    match tone {
        Tone::Urgent => Some("Vamos agir rápido, passo a passo."),
        Tone::Supportive => Some("Calma, dá para organizar isso juntos."),
        Tone::Friendly => Some("Bora lá!"),
        Tone::Professional => None,
    }
}

fn horizon_label(horizon: Horizon) -> &'static str {
    match horizon {
        Horizon::Short => "curto prazo",
        Horizon::Medium => "médio prazo",
        Horizon::Long => "longo prazo",
    }
}

pub fn render_narrative(narrative: &Narrative) -> Vec<String> {
    match narrative {
        Narrative::Glossary { entries } => entries
            .iter()
            .map(|e| format!("📖 {}: {}", e.title, e.definition))
            .collect(),

        Narrative::SavingsPlan {
            status,
            savings_rate,
            balance,
            monthly_target,
            top_expense,
        } => {
            let headline = match status {
                SavingsStatus::Deficit => format!(
                    "🔴 Você gastou mais do que ganhou: saldo de {} no mês.",
                    format_brl(*balance)
                ),
                SavingsStatus::Low => format!(
                    "🟡 Você está poupando {} da renda, abaixo do ideal.",
                    format_pct(*savings_rate)
                ),
                SavingsStatus::Healthy => format!(
                    "🟢 Boa! Você está poupando {} da renda.",
                    format_pct(*savings_rate)
                ),
            };
            let mut lines = vec![
                headline,
                format!("   Meta mensal de poupança: {}", format_brl(*monthly_target)),
            ];
            if let Some(category) = top_expense {
                lines.push(format!("   Comece revendo: {}", category));
            }
            lines
        }

        Narrative::InvestmentPlan {
            risk_profile,
            base_amount,
            horizon_months,
            horizon,
            allocation,
        } => vec![
            format!(
                "📈 Plano para investir {} em {} meses ({}), perfil {}:",
                format_brl(*base_amount),
                horizon_months,
                horizon_label(*horizon),
                risk_profile.label()
            ),
            format!("   Liquidez diária:        {}", format_brl(allocation.liquidity)),
            format!("   Renda fixa curta:       {}", format_brl(allocation.short_term)),
            format!("   Carteira diversificada: {}", format_brl(allocation.diversified)),
            format!("   Oportunidades:          {}", format_brl(allocation.opportunistic)),
        ],

        Narrative::InvestmentReadiness {
            savings_rate,
            cushion_ok,
            monthly_goal,
        } => {
            let mut lines = vec![format!(
                "⏳ Antes de investir, fortaleça a base: você poupa {} da renda.",
                format_pct(*savings_rate)
            )];
            if !cushion_ok {
                lines.push("   Monte primeiro um colchão de pelo menos meio mês de renda.".into());
            }
            lines.push(format!("   Meta: separar {} por mês.", format_brl(*monthly_goal)));
            lines
        }

        Narrative::DebtPayoff {
            total_debt,
            three_month_goal,
            can_pay,
            emotional,
        } => {
            let mut lines = Vec::new();
            if *emotional {
                lines.push("💙 Dívida assusta, mas tem saída.".to_string());
            }
            lines.push(format!("💳 Dívidas no período: {}", format_brl(*total_debt)));
            lines.push(format!(
                "   Meta para 3 meses: quitar {}",
                format_brl(*three_month_goal)
            ));
            lines.push(if *can_pay {
                "   Seu saldo atual cobre essa meta.".to_string()
            } else {
                "   Seu saldo ainda não cobre a meta: renegocie juros e corte gastos.".to_string()
            });
            lines
        }

        Narrative::IncomeGrowth {
            income,
            potential,
            six_month_target,
        } => {
            let potential = match potential {
                GrowthPotential::High => "alto",
                GrowthPotential::Moderate => "moderado",
                GrowthPotential::Stable => "estável",
            };
            vec![
                format!(
                    "💼 Renda atual de {}, potencial de crescimento {}.",
                    format_brl(*income),
                    potential
                ),
                format!(
                    "   Meta em 6 meses: mais {} por mês.",
                    format_brl(*six_month_target)
                ),
            ]
        }

        Narrative::CutPlan {
            plan,
            expense_ratio,
            target_expense_ratio,
            monthly_saving,
        } => {
            let mut lines = vec![format!(
                "✂️  Seus gastos consomem {} da renda; o alvo é {}.",
                format_pct(*expense_ratio),
                format_pct(*target_expense_ratio)
            )];
            for item in &plan.items {
                lines.push(format!(
                    "   {}: {} → cortar {}",
                    item.category,
                    format_brl(item.current),
                    format_brl(item.cut_value)
                ));
            }
            if let Some(weekly) = &plan.weekly {
                lines.push(format!(
                    "   Por semana: {} a menos em {}",
                    format_brl(weekly.amount),
                    weekly.category
                ));
            }
            lines.push(format!("   Economia mensal estimada: {}", format_brl(*monthly_saving)));
            lines
        }

        Narrative::BudgetReview { split } => vec![
            "📊 Orçamento 50/30/20 (meta × atual):".to_string(),
            format!(
                "   Necessidades: {} × {}",
                format_brl(split.target_needs),
                format_brl(split.actual_needs)
            ),
            format!(
                "   Desejos:      {} × {}",
                format_brl(split.target_wants),
                format_brl(split.actual_wants)
            ),
            format!(
                "   Poupança:     {} × {}",
                format_brl(split.target_savings),
                format_brl(split.actual_savings)
            ),
        ],

        Narrative::EmergencyPlan {
            plan,
            current_balance,
        } => {
            let mut lines = vec![
                format!(
                    "🛟 Reserva de emergência: {} ({} meses de gastos).",
                    format_brl(plan.target),
                    plan.buffer_months
                ),
                format!(
                    "   Contribua com {} por mês; saldo atual {}.",
                    format_brl(plan.monthly_contribution),
                    format_brl(*current_balance)
                ),
            ];
            if let Some(months) = plan.months_to_reach {
                lines.push(format!("   Prazo estimado: {} meses.", months));
            }
            lines
        }

        Narrative::GoalPlan {
            goal,
            horizon_months,
            monthly_contribution,
            projected_total,
        } => vec![
            format!("🎯 Objetivo: {}", goal.label()),
            format!(
                "   Guardando {} por mês durante {} meses, você junta {}.",
                format_brl(*monthly_contribution),
                horizon_months,
                format_brl(*projected_total)
            ),
        ],

        Narrative::Overview {
            score,
            top_focus,
            alerts,
        } => {
            let mut lines = vec![format!("🧭 Sua pontuação financeira: {}/100", score)];
            if let Some(focus) = top_focus {
                lines.push(format!("   Seu foco mais frequente: {}", focus.label()));
            }
            for alert in alerts {
                lines.push(format!("⚠️  {}", alert.message()));
            }
            lines
        }
    }
}
