//! Entity extraction from pt-BR questions
//!
//! Pulls monetary amounts, percentages and time horizons out of free text.
//! Extraction never fails: fragments that look numeric but do not parse are
//! left out of the result.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::normalize;

/// Currency marker, pt-BR number, optional magnitude suffix ending at a word boundary
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:r\$|\$)?\s*(\d[\d.,]*)(?:\s*(bilhoes|bilhao|milhoes|milhao|mil|bi|mi|b|m|k)\b)?")
        .expect("amount pattern is valid")
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*%").expect("percent pattern is valid")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(semanas|semana|meses|mes|anos|ano)\b").expect("duration pattern is valid")
});

/// A number directly followed by one of these is a percent or a duration, not money
static NON_MONEY_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:%|(?:semanas|semana|meses|mes|anos|ano)\b)").expect("tail pattern is valid")
});

/// Magnitude suffixes, larger words first so `milhao` wins over `mil`
const MAGNITUDES: &[(&str, f64)] = &[
    ("bilhoes", 1_000_000_000.0),
    ("bilhao", 1_000_000_000.0),
    ("milhoes", 1_000_000.0),
    ("milhao", 1_000_000.0),
    ("mil", 1_000.0),
    ("bi", 1_000_000_000.0),
    ("mi", 1_000_000.0),
    ("b", 1_000_000_000.0),
    ("m", 1_000_000.0),
    ("k", 1_000.0),
];

/// Structured values found in a question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    /// Monetary values in BRL, in order of appearance
    pub amounts: Vec<f64>,
    /// Percentages in [0, 100]
    pub percents: Vec<f64>,
    /// Time horizons converted to months
    pub months: Vec<u32>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty() && self.percents.is_empty() && self.months.is_empty()
    }

    pub fn first_amount(&self) -> Option<f64> {
        self.amounts.first().copied()
    }

    pub fn first_percent(&self) -> Option<f64> {
        self.percents.first().copied()
    }

    pub fn first_horizon(&self) -> Option<u32> {
        self.months.first().copied()
    }
}

/// Extract amounts, percents and durations from a question
pub fn extract(text: &str) -> ExtractedEntities {
    let text = normalize(text);

    ExtractedEntities {
        amounts: extract_amounts(&text),
        percents: extract_percents(&text),
        months: extract_durations(&text),
    }
}

fn extract_amounts(text: &str) -> Vec<f64> {
    let mut amounts = Vec::new();

    for caps in AMOUNT_RE.captures_iter(text) {
        let Some(number) = caps.get(1) else {
            continue;
        };
        let suffix = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        if suffix.is_empty() && NON_MONEY_TAIL_RE.is_match(&text[number.end()..]) {
            continue;
        }

        let token = format!("{}{}", number.as_str(), suffix);
        if let Some(value) = parse_amount_token(&token) {
            amounts.push(value);
        }
    }

    amounts
}

fn extract_percents(text: &str) -> Vec<f64> {
    PERCENT_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .filter(|p| (0.0..=100.0).contains(p))
        .collect()
}

fn extract_durations(text: &str) -> Vec<u32> {
    let mut months = Vec::new();

    for caps in DURATION_RE.captures_iter(text) {
        let Ok(qty) = caps[1].parse::<u32>() else {
            continue;
        };
        if qty == 0 {
            continue;
        }

        let converted = match &caps[2] {
            "ano" | "anos" => qty.checked_mul(12),
            "semana" | "semanas" => Some((qty / 4).max(1)),
            _ => Some(qty),
        };

        if let Some(m) = converted {
            months.push(m);
        }
    }

    months
}

/// Parse one pt-BR amount token such as `1.234,56`, `3,5k`, `2 mil` or `r$ 1mi`
///
/// `.` groups thousands and `,` is the decimal separator. Returns `None`
/// when nothing numeric is left after stripping the currency marker and
/// magnitude suffix.
pub fn parse_amount_token(token: &str) -> Option<f64> {
    let compact: String = token
        .to_lowercase()
        .replace("r$", "")
        .replace('$', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let (number, multiplier) = MAGNITUDES
        .iter()
        .find_map(|(suffix, mult)| compact.strip_suffix(suffix).map(|rest| (rest, *mult)))
        .unwrap_or((compact.as_str(), 1.0));

    if !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let canonical = number.replace('.', "").replace(',', ".");
    canonical
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_parse_amount_token_fixtures() {
        assert!(approx(parse_amount_token("1.234,56").unwrap(), 1234.56));
        assert!(approx(parse_amount_token("3,5k").unwrap(), 3500.0));
        assert!(approx(parse_amount_token("2 mil").unwrap(), 2000.0));
        assert!(approx(parse_amount_token("1mi").unwrap(), 1_000_000.0));
        assert!(approx(parse_amount_token("R$ 250").unwrap(), 250.0));
        assert!(approx(parse_amount_token("2 bi").unwrap(), 2_000_000_000.0));
        assert!(approx(parse_amount_token("1,5 milhao").unwrap(), 1_500_000.0));
        assert!(approx(parse_amount_token("3 bilhoes").unwrap(), 3_000_000_000.0));
    }

    #[test]
    fn test_parse_amount_token_rejects_garbage() {
        assert_eq!(parse_amount_token(""), None);
        assert_eq!(parse_amount_token("mil"), None);
        assert_eq!(parse_amount_token("r$"), None);
        assert_eq!(parse_amount_token("1,2,3"), None);
    }

    #[test]
    fn test_extract_amounts_in_order() {
        let e = extract("Tenho R$ 1.234,56 e quero chegar a 3,5k, talvez 2 mil ou 1mi");
        assert_eq!(e.amounts.len(), 4);
        assert!(approx(e.amounts[0], 1234.56));
        assert!(approx(e.amounts[1], 3500.0));
        assert!(approx(e.amounts[2], 2000.0));
        assert!(approx(e.amounts[3], 1_000_000.0));
    }

    #[test]
    fn test_extract_percent_in_range_only() {
        let e = extract("rende 12,5% ao ano, nao 150% nem 0%");
        assert_eq!(e.percents, vec![12.5, 0.0]);
        assert!(e.amounts.is_empty());
    }

    #[test]
    fn test_extract_durations() {
        let e = extract("em 2 anos, 6 meses ou 10 semanas, talvez 2 semanas e 1 mês");
        assert_eq!(e.months, vec![24, 6, 2, 1, 1]);
        assert!(e.amounts.is_empty(), "durations must not be read as amounts: {:?}", e.amounts);
    }

    #[test]
    fn test_month_suffix_needs_word_boundary() {
        let e = extract("quero juntar 5 mil em 6 meses");
        assert_eq!(e.amounts, vec![5000.0]);
        assert_eq!(e.months, vec![6]);
    }

    #[test]
    fn test_extract_trailing_punctuation() {
        let e = extract("Investir 500, depois 1.000.");
        assert_eq!(e.amounts, vec![500.0, 1000.0]);
    }

    #[test]
    fn test_extract_empty_text() {
        let e = extract("");
        assert!(e.is_empty());
        assert_eq!(e.first_amount(), None);
        assert_eq!(e.first_horizon(), None);
    }

    #[test]
    fn test_extract_accepts_accented_input() {
        let e = extract("Quero investir R$ 10 mil por 3 anos com 10% de aporte");
        assert_eq!(e.amounts, vec![10_000.0]);
        assert_eq!(e.months, vec![36]);
        assert_eq!(e.percents, vec![10.0]);
    }
}
