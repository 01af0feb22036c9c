//! Text canonicalization for pt-BR questions
//!
//! Every matcher in the crate works on normalized text: lowercase, no
//! diacritics, single spaces. Lexicon phrases go through the same function
//! at load time so both sides agree.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, strip diacritics (NFD, drop combining marks) and collapse whitespace
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.extend(c.to_lowercase().filter(|lc| !is_combining_mark(*lc)));
    }

    out
}

/// Whether `text[start..end]` begins and ends on word boundaries
pub fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let starts_word = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric());
    starts_word && text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric())
}

/// Whether normalized `text` contains normalized `term`
///
/// Plain substring search, so `investir` is found inside `reinvestir`. With
/// `whole_word` set the occurrence must stand alone, which keeps `eth` out of
/// `method` and `casa` out of `casamento`.
pub fn contains_term(text: &str, term: &str, whole_word: bool) -> bool {
    if term.is_empty() {
        return false;
    }
    if !whole_word {
        return text.contains(term);
    }
    text.match_indices(term)
        .any(|(start, m)| is_whole_word(text, start, start + m.len()))
}

/// Format a value as Brazilian currency, e.g. `R$ 1.234,56`
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, frac)
}
