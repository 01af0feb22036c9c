//! Profile and allocation command implementations

use anyhow::{Context, Result};
use prumo_core::{
    db::Database,
    import::parse_amount,
    models::RiskProfile,
    profile::{allocate, Allocation},
    text::format_brl,
};
use serde::Serialize;

use super::{print_json, Output};

pub fn cmd_profile_show(db: &Database, user_id: i64, output: Output) -> Result<()> {
    let profile = db
        .get_or_create_profile(user_id)
        .context("Failed to load profile")?;

    if output == Output::Json {
        return print_json(&profile);
    }

    println!();
    println!("👤 Perfil do usuário {}", profile.user_id);
    println!("   ─────────────────────────────");
    println!("   Perfil de risco:      {}", profile.risk_profile.label());
    println!("   Meta de poupança:     {}%", profile.savings_target_pct);
    println!(
        "   Reserva de emergência: {} meses",
        profile.emergency_months_target
    );
    println!("   Perguntas feitas:     {}", profile.interaction_count);

    if !profile.focus_counters.is_empty() {
        let mut focus: Vec<_> = profile.focus_counters.iter().collect();
        focus.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        println!();
        println!("   Assuntos mais frequentes:");
        for (intent, count) in focus.into_iter().take(5) {
            println!("   {:<24} {}", intent.label(), count);
        }
    }

    Ok(())
}

pub fn cmd_profile_set_risk(db: &Database, user_id: i64, profile: &str) -> Result<()> {
    let risk: RiskProfile = profile.parse().map_err(|e: String| {
        anyhow::anyhow!("{}. Use one of: conservative, moderate, aggressive", e)
    })?;

    let saved = db
        .set_risk_profile(user_id, risk)
        .context("Failed to update risk profile")?;

    println!("✅ Perfil de risco atualizado: {}", saved.risk_profile.label());
    Ok(())
}

#[derive(Serialize)]
struct AllocateOutput {
    risk_profile: RiskProfile,
    amount: f64,
    allocation: Allocation,
}

pub fn cmd_allocate(db: &Database, user_id: i64, amount: &str, output: Output) -> Result<()> {
    let amount = parse_amount(amount).with_context(|| format!("Invalid amount: {}", amount))?;
    let profile = db
        .get_or_create_profile(user_id)
        .context("Failed to load profile")?;
    let allocation = allocate(&profile, amount);

    if output == Output::Json {
        return print_json(&AllocateOutput {
            risk_profile: profile.risk_profile,
            amount,
            allocation,
        });
    }

    println!();
    println!(
        "💰 Divisão de {} (perfil {})",
        format_brl(amount.max(0.0)),
        profile.risk_profile.label()
    );
    println!("   ─────────────────────────────");
    println!("   Liquidez diária:        {}", format_brl(allocation.liquidity));
    println!("   Renda fixa curta:       {}", format_brl(allocation.short_term));
    println!("   Carteira diversificada: {}", format_brl(allocation.diversified));
    println!("   Oportunidades:          {}", format_brl(allocation.opportunistic));

    Ok(())
}
