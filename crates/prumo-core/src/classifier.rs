//! Intent classification for pt-BR financial questions
//!
//! Scores every intent by the lexicon phrases found in the normalized
//! question, boosts intents selected by literal patterns, and falls back to
//! a small set of contextual rules when nothing matched. Classification is
//! deterministic and never fails: the result always holds at least one
//! intent.
//!
//! All phrases and markers are compiled into a single Aho-Corasick
//! automaton, so one pass over the text finds every term.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use aho_corasick::AhoCorasick;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::lexicon::{Lexicon, Scoring};
use crate::models::Intent;
use crate::text::{is_whole_word, normalize};

/// Register to answer in, inferred from the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Distress and urgency together
    Urgent,
    /// Distress without urgency
    Supportive,
    /// Colloquial wording only
    Friendly,
    Professional,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Supportive => "supportive",
            Self::Friendly => "friendly",
            Self::Professional => "professional",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full classifier output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Ranked intents, never empty
    pub intents: Vec<Intent>,
    /// Lexicon score plus pattern boosts, for intents that scored
    pub scores: BTreeMap<Intent, u32>,
    /// Intents selected by at least one literal pattern
    pub pattern_matched: BTreeSet<Intent>,
    /// Whether the contextual fallback produced the result
    pub fallback_used: bool,
    pub tone: Tone,
}

impl Classification {
    /// Highest ranked intent
    pub fn primary(&self) -> Intent {
        self.intents.first().copied().unwrap_or(Intent::Help)
    }

    pub fn contains(&self, intent: Intent) -> bool {
        self.intents.contains(&intent)
    }
}

/// A phrase that contributes to one intent's score
#[derive(Debug, Clone)]
struct ScoredPhrase {
    term: usize,
    /// Base, action and length weight; context bonuses are added per question
    weight: u32,
}

#[derive(Debug, Clone)]
struct IntentTerms {
    intent: Intent,
    phrases: Vec<ScoredPhrase>,
}

#[derive(Debug, Clone)]
struct RouteTerms {
    intent: Intent,
    terms: Vec<usize>,
    requires_distress: bool,
}

/// Term ids present in one question
struct Hits {
    present: Vec<bool>,
}

impl Hits {
    fn has(&self, term: usize) -> bool {
        self.present.get(term).copied().unwrap_or(false)
    }

    fn any(&self, terms: &[usize]) -> bool {
        terms.iter().any(|&t| self.has(t))
    }
}

/// Lexicon-driven intent classifier
///
/// Immutable after construction and safe to share between threads.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    lexicon: Lexicon,
    matcher: AhoCorasick,
    /// Per automaton term, whether a hit must stand alone as a word
    whole_word: Vec<bool>,
    intents: Vec<IntentTerms>,
    /// Automaton term id for each lexicon pattern, same order as `lexicon.patterns`
    pattern_terms: Vec<usize>,
    distress: Vec<usize>,
    urgency: Vec<usize>,
    informal: Vec<usize>,
    money: Vec<usize>,
    routes: Vec<RouteTerms>,
}

/// Deduplicating term table feeding the automaton
#[derive(Default)]
struct TermTable {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl TermTable {
    fn id(&mut self, term: &str) -> usize {
        if let Some(&id) = self.index.get(term) {
            return id;
        }
        let id = self.terms.len();
        self.terms.push(term.to_string());
        self.index.insert(term.to_string(), id);
        id
    }

    fn ids(&mut self, terms: &[String]) -> Vec<usize> {
        terms.iter().map(|t| self.id(t)).collect()
    }
}

impl IntentClassifier {
    /// Build a classifier from the override lexicon or the embedded default
    pub fn load() -> Result<Self> {
        Self::new(Lexicon::load()?)
    }

    /// Build a classifier from an explicit lexicon
    pub fn new(lexicon: Lexicon) -> Result<Self> {
        let mut table = TermTable::default();
        let scoring = lexicon.scoring;

        let intents = lexicon
            .intents
            .iter()
            .map(|entry| IntentTerms {
                intent: entry.intent,
                phrases: entry
                    .phrases
                    .iter()
                    .map(|phrase| ScoredPhrase {
                        term: table.id(phrase),
                        weight: phrase_weight(phrase, &lexicon.action_words, &scoring),
                    })
                    .collect(),
            })
            .collect();

        let pattern_terms = lexicon.patterns.iter().map(|p| table.id(&p.phrase)).collect();
        let distress = table.ids(&lexicon.distress_markers);
        let urgency = table.ids(&lexicon.urgency_markers);
        let informal = table.ids(&lexicon.informal_markers);
        let money = table.ids(&lexicon.fallback.money_words);
        let routes = lexicon
            .fallback
            .routes
            .iter()
            .map(|r| RouteTerms {
                intent: r.intent,
                terms: table.ids(&r.words),
                requires_distress: r.requires_distress,
            })
            .collect();

        let matcher = AhoCorasick::new(&table.terms)
            .map_err(|e| Error::Config(format!("Failed to build lexicon matcher: {}", e)))?;
        let whole_word = table.terms.iter().map(|t| lexicon.is_whole_word(t)).collect();

        debug!(
            terms = table.terms.len(),
            patterns = lexicon.patterns.len(),
            "Built intent classifier"
        );

        Ok(Self {
            lexicon,
            matcher,
            whole_word,
            intents,
            pattern_terms,
            distress,
            urgency,
            informal,
            money,
            routes,
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Ranked intents for a question (never empty)
    pub fn classify(&self, text: &str) -> Vec<Intent> {
        self.classify_scored(text).intents
    }

    /// Classify and keep the scoring detail
    pub fn classify_scored(&self, text: &str) -> Classification {
        let text = normalize(text);
        let hits = self.scan(&text);

        let distress = hits.any(&self.distress);
        let urgency = hits.any(&self.urgency);
        let scoring = &self.lexicon.scoring;

        let context_bonus = if distress { scoring.distress_bonus } else { 0 }
            + if urgency { scoring.urgency_bonus } else { 0 };

        let mut scores: BTreeMap<Intent, u32> = BTreeMap::new();
        for entry in &self.intents {
            let score: u32 = entry
                .phrases
                .iter()
                .filter(|p| hits.has(p.term))
                .map(|p| p.weight + context_bonus)
                .sum();
            if score > 0 {
                scores.insert(entry.intent, score);
            }
        }

        let mut pattern_matched = BTreeSet::new();
        for (pattern, &term) in self.lexicon.patterns.iter().zip(&self.pattern_terms) {
            if !hits.has(term) {
                continue;
            }
            if let Some(intent) = pattern.resolve(&text) {
                *scores.entry(intent).or_insert(0) += scoring.pattern_boost;
                pattern_matched.insert(intent);
            }
        }

        let tone = match (distress, urgency) {
            (true, true) => Tone::Urgent,
            (true, false) => Tone::Supportive,
            _ if hits.any(&self.informal) => Tone::Friendly,
            _ => Tone::Professional,
        };

        let mut ranked: Vec<(Intent, u32, bool)> = scores
            .iter()
            .map(|(&intent, &score)| (intent, score, pattern_matched.contains(&intent)))
            .collect();
        ranked.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| b.1.cmp(&a.1))
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut intents: Vec<Intent> = ranked.into_iter().map(|(intent, _, _)| intent).collect();
        let fallback_used = intents.is_empty();
        if fallback_used {
            intents.push(self.fallback(&hits, distress));
        }

        debug!(
            intents = ?intents,
            fallback = fallback_used,
            tone = %tone,
            "Classified question"
        );

        Classification {
            intents,
            scores,
            pattern_matched,
            fallback_used,
            tone,
        }
    }

    fn scan(&self, text: &str) -> Hits {
        let mut present = vec![false; self.whole_word.len()];
        for m in self.matcher.find_overlapping_iter(text) {
            let id = m.pattern().as_usize();
            if present[id] {
                continue;
            }
            if !self.whole_word[id] || is_whole_word(text, m.start(), m.end()) {
                present[id] = true;
            }
        }
        Hits { present }
    }

    fn fallback(&self, hits: &Hits, distress: bool) -> Intent {
        if !hits.any(&self.money) {
            return Intent::Help;
        }

        self.routes
            .iter()
            .filter(|route| distress || !route.requires_distress)
            .find(|route| hits.any(&route.terms))
            .map(|route| route.intent)
            .unwrap_or(if distress { Intent::Planning } else { Intent::Help })
    }
}

/// Static part of a phrase's score
///
/// The action bonus goes only to a phrase that is itself an action word:
/// `investir` earns it, `como investir` does not.
fn phrase_weight(phrase: &str, action_words: &[String], scoring: &Scoring) -> u32 {
    let extra_words = phrase.split(' ').count().saturating_sub(1) as u32;
    let has_action = action_words.iter().any(|a| a == phrase);

    scoring.base
        + if has_action { scoring.action_bonus } else { 0 }
        + scoring.length_bonus * extra_words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new(Lexicon::embedded().unwrap()).unwrap()
    }

    #[test]
    fn test_buying_a_car_is_vehicle() {
        let result = classifier().classify_scored("Quero comprar um carro");
        assert_eq!(result.primary(), Intent::Vehicle);
        assert!(result.pattern_matched.contains(&Intent::Vehicle));
        assert!(!result.fallback_used);
    }

    #[test]
    fn test_buying_something_else_has_no_pattern_override() {
        let result = classifier().classify_scored("quero comprar um apartamento");
        assert_eq!(result.primary(), Intent::RealEstate);

        let result = classifier().classify_scored("quero comprar um celular");
        assert!(result.pattern_matched.is_empty());
    }

    #[test]
    fn test_empty_and_noise_are_help() {
        let c = classifier();
        assert_eq!(c.classify(""), vec![Intent::Help]);
        assert_eq!(c.classify("   "), vec![Intent::Help]);
        assert_eq!(c.classify("asdf qwerty zxcv"), vec![Intent::Help]);
        assert!(c.classify_scored("asdf qwerty zxcv").fallback_used);
    }

    #[test]
    fn test_score_components() {
        // investir (1 + 2 action), como investir (1 + 3), invest (1)
        let result = classifier().classify_scored("como investir");
        assert_eq!(result.scores.get(&Intent::Investment), Some(&8));
        assert_eq!(result.intents, vec![Intent::Investment]);
        assert_eq!(result.tone, Tone::Professional);
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        let result = classifier().classify_scored("saldo negativo");
        assert_eq!(result.intents, vec![Intent::Savings, Intent::Expense]);
        assert_eq!(
            result.scores.get(&Intent::Savings),
            result.scores.get(&Intent::Expense)
        );
    }

    #[test]
    fn test_pattern_matched_rank_first() {
        let result = classifier().classify_scored("Tô no vermelho, me ajuda!");
        assert_eq!(result.intents[0], Intent::Debt);
        assert_eq!(result.intents[1], Intent::Help);
        assert!(result.contains(Intent::Savings));
        assert!(result.contains(Intent::Planning));
        assert_eq!(result.tone, Tone::Supportive);
    }

    #[test]
    fn test_urgent_tone() {
        let result = classifier().classify_scored("Preciso pagar a fatura do cartão urgente");
        assert_eq!(result.primary(), Intent::CreditCard);
        assert_eq!(result.tone, Tone::Urgent);
    }

    #[test]
    fn test_friendly_tone() {
        let result = classifier().classify_scored("vale a pena fazer um bico?");
        assert_eq!(result.primary(), Intent::Income);
        assert_eq!(result.tone, Tone::Friendly);
    }

    #[test]
    fn test_fallback_routes() {
        let c = classifier();

        let result = c.classify_scored("sobrar dinheiro no fim do mes");
        assert!(result.fallback_used);
        assert_eq!(result.intents, vec![Intent::Savings]);

        assert_eq!(c.classify("to sem grana"), vec![Intent::Planning]);
        assert_eq!(c.classify("vou ao casamento"), vec![Intent::Help]);
    }

    #[test]
    fn test_action_bonus_needs_the_bare_action_word() {
        let lexicon = Lexicon::embedded().unwrap();
        let scoring = lexicon.scoring;
        let actions = &lexicon.action_words;
        assert_eq!(phrase_weight("investir", actions, &scoring), 3);
        assert_eq!(phrase_weight("como investir", actions, &scoring), 4);
        assert_eq!(phrase_weight("melhor forma de investir", actions, &scoring), 10);
        assert_eq!(phrase_weight("lucro", actions, &scoring), 1);
    }

    #[test]
    fn test_terms_match_inside_words() {
        let result = classifier().classify_scored("quero reinvestir os dividendos");
        assert_eq!(result.intents, vec![Intent::Investment]);
        assert!(!result.fallback_used);
        // investir (3) and invest (1), each with the distress bonus
        assert_eq!(result.scores.get(&Intent::Investment), Some(&8));
    }

    #[test]
    fn test_whole_word_terms_stand_alone() {
        let c = classifier();
        assert!(!c.classify("o method do casamento").contains(&Intent::Crypto));
        assert!(c.classify("vale comprar eth?").contains(&Intent::Crypto));
        // "sou" inside "tesouro" is not a distress marker
        assert_eq!(c.classify_scored("quanto rende o tesouro?").tone, Tone::Professional);
        // nor is "ta" inside "custa" colloquial
        assert_eq!(c.classify_scored("quanto custa um carro?").tone, Tone::Professional);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        let question = "Como economizar para a aposentadoria e quitar o cartão?";
        let first = c.classify_scored(question);
        for _ in 0..5 {
            assert_eq!(c.classify_scored(question), first);
        }
        assert!(first.contains(Intent::Retirement));
        assert!(first.contains(Intent::Savings));
    }

    #[test]
    fn test_classifier_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IntentClassifier>();
    }
}
