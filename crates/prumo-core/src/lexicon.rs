//! Keyword lexicon for intent classification
//!
//! The lexicon is plain data: per-intent phrase lists, marker word lists,
//! scoring weights, literal pattern overrides and the fallback routes.
//!
//! ## Configuration Resolution
//!
//! Loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/prumo/config/lexicon.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Every phrase is normalized at load time so it can be matched against
//! normalized question text. Terms match anywhere in the text unless they
//! are listed in `whole_words`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Intent;
use crate::text::{contains_term, normalize};

/// Embedded default lexicon (compiled into binary)
const DEFAULT_LEXICON: &str = include_str!("../../../config/lexicon.toml");

/// Score weights applied per phrase hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scoring {
    pub base: u32,
    /// Added when the phrase itself is an action word
    pub action_bonus: u32,
    /// Added per word beyond the first
    pub length_bonus: u32,
    pub distress_bonus: u32,
    pub urgency_bonus: u32,
    /// Added to an intent for every literal pattern that selects it
    pub pattern_boost: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            base: 1,
            action_bonus: 2,
            length_bonus: 3,
            distress_bonus: 2,
            urgency_bonus: 3,
            pattern_boost: 10,
        }
    }
}

/// Normalized phrase list for one intent
#[derive(Debug, Clone)]
pub struct IntentPhrases {
    pub intent: Intent,
    pub phrases: Vec<String>,
}

/// One branch of a contextual pattern
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWord {
    pub word: String,
    pub whole_word: bool,
    pub intent: Intent,
}

/// What a literal pattern resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum PatternTarget {
    Fixed(Intent),
    /// First branch whose word occurs in the text, else `otherwise`
    Contextual {
        when: Vec<ContextWord>,
        otherwise: Option<Intent>,
    },
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub phrase: String,
    pub target: PatternTarget,
}

impl Pattern {
    /// Intent selected by this pattern for already-normalized `text`
    ///
    /// Does not check that the pattern phrase itself occurs.
    pub fn resolve(&self, text: &str) -> Option<Intent> {
        match &self.target {
            PatternTarget::Fixed(intent) => Some(*intent),
            PatternTarget::Contextual { when, otherwise } => when
                .iter()
                .find(|w| contains_term(text, &w.word, w.whole_word))
                .map(|w| w.intent)
                .or(*otherwise),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackRoute {
    pub intent: Intent,
    pub words: Vec<String>,
    /// Only taken when a distress marker is present
    pub requires_distress: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Fallback {
    pub money_words: Vec<String>,
    pub routes: Vec<FallbackRoute>,
}

/// Category stems for the needs/wants budget split
#[derive(Debug, Clone, Default)]
pub struct BudgetKeywords {
    pub needs: Vec<String>,
    pub wants: Vec<String>,
}

impl BudgetKeywords {
    pub fn is_need(&self, category: &str) -> bool {
        let category = normalize(category);
        self.needs.iter().any(|k| category.contains(k.as_str()))
    }

    pub fn is_want(&self, category: &str) -> bool {
        let category = normalize(category);
        self.wants.iter().any(|k| category.contains(k.as_str()))
    }
}

/// Immutable classification tables
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub version: u32,
    pub action_words: Vec<String>,
    pub distress_markers: Vec<String>,
    pub urgency_markers: Vec<String>,
    pub informal_markers: Vec<String>,
    /// Terms that only match standing alone, e.g. `eth` or `casa`
    pub whole_words: HashSet<String>,
    pub scoring: Scoring,
    /// Ordered by intent declaration order
    pub intents: Vec<IntentPhrases>,
    pub patterns: Vec<Pattern>,
    pub fallback: Fallback,
    pub budget: BudgetKeywords,
}

impl Lexicon {
    /// Load the override file if present, otherwise the embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Self::embedded(),
        }
    }

    /// Load from an explicit file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read lexicon {}: {}", path.display(), e))
        })?;
        debug!("Loading lexicon from {}", path.display());
        Self::from_toml(&content)
    }

    /// The lexicon compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_LEXICON)
    }

    /// Parse and validate a lexicon document
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawLexicon = toml::from_str(content)?;
        build(raw)
    }

    /// Phrases for one intent (empty when the intent has none)
    pub fn phrases_for(&self, intent: Intent) -> &[String] {
        self.intents
            .iter()
            .find(|entry| entry.intent == intent)
            .map(|entry| entry.phrases.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_whole_word(&self, term: &str) -> bool {
        self.whole_words.contains(term)
    }
}

/// Default lexicon override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("prumo").join("config").join("lexicon.toml"))
}

/// Raw lexicon structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawLexicon {
    version: Option<u32>,
    #[serde(default)]
    action_words: Vec<String>,
    #[serde(default)]
    distress_markers: Vec<String>,
    #[serde(default)]
    urgency_markers: Vec<String>,
    #[serde(default)]
    informal_markers: Vec<String>,
    #[serde(default)]
    whole_words: Vec<String>,
    scoring: Option<RawScoring>,
    #[serde(default)]
    intents: Vec<RawIntent>,
    #[serde(default)]
    patterns: Vec<RawPattern>,
    fallback: Option<RawFallback>,
    budget: Option<RawBudget>,
}

#[derive(Debug, Deserialize)]
struct RawScoring {
    base: Option<u32>,
    action_bonus: Option<u32>,
    length_bonus: Option<u32>,
    distress_bonus: Option<u32>,
    urgency_bonus: Option<u32>,
    pattern_boost: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    intent: String,
    #[serde(default)]
    phrases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPattern {
    phrase: String,
    intent: Option<String>,
    #[serde(default)]
    when: Vec<RawWhen>,
    otherwise: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWhen {
    contains: String,
    intent: String,
}

#[derive(Debug, Deserialize)]
struct RawFallback {
    #[serde(default)]
    money_words: Vec<String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    intent: String,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    requires_distress: bool,
}

#[derive(Debug, Deserialize)]
struct RawBudget {
    #[serde(default)]
    needs: Vec<String>,
    #[serde(default)]
    wants: Vec<String>,
}

fn parse_intent(name: &str, context: &str) -> Result<Intent> {
    name.parse::<Intent>()
        .map_err(|_| Error::Config(format!("Unknown intent '{}' in {}", name, context)))
}

/// Normalize, drop empties and duplicates, keep first-seen order
fn normalize_list(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .map(|w| normalize(&w))
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect()
}

fn build(raw: RawLexicon) -> Result<Lexicon> {
    let mut scoring = Scoring::default();
    if let Some(s) = raw.scoring {
        if let Some(v) = s.base {
            scoring.base = v;
        }
        if let Some(v) = s.action_bonus {
            scoring.action_bonus = v;
        }
        if let Some(v) = s.length_bonus {
            scoring.length_bonus = v;
        }
        if let Some(v) = s.distress_bonus {
            scoring.distress_bonus = v;
        }
        if let Some(v) = s.urgency_bonus {
            scoring.urgency_bonus = v;
        }
        if let Some(v) = s.pattern_boost {
            scoring.pattern_boost = v;
        }
    }

    let whole_words: HashSet<String> = normalize_list(raw.whole_words).into_iter().collect();

    let mut intents: Vec<IntentPhrases> = Vec::with_capacity(raw.intents.len());
    for entry in raw.intents {
        let intent = parse_intent(&entry.intent, "[[intents]]")?;
        if intents.iter().any(|e| e.intent == intent) {
            return Err(Error::Config(format!(
                "Intent '{}' is declared more than once",
                intent
            )));
        }
        intents.push(IntentPhrases {
            intent,
            phrases: normalize_list(entry.phrases),
        });
    }
    intents.sort_by_key(|e| e.intent);

    let mut patterns = Vec::with_capacity(raw.patterns.len());
    for p in raw.patterns {
        let phrase = normalize(&p.phrase);
        if phrase.is_empty() {
            return Err(Error::Config("Pattern with an empty phrase".into()));
        }
        let context = format!("pattern '{}'", p.phrase);

        let target = match (p.intent, p.when.is_empty()) {
            (Some(intent), true) if p.otherwise.is_none() => {
                PatternTarget::Fixed(parse_intent(&intent, &context)?)
            }
            (None, false) => {
                let when = p
                    .when
                    .into_iter()
                    .map(|w| {
                        let word = normalize(&w.contains);
                        Ok(ContextWord {
                            whole_word: whole_words.contains(&word),
                            intent: parse_intent(&w.intent, &context)?,
                            word,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let otherwise = p
                    .otherwise
                    .map(|o| parse_intent(&o, &context))
                    .transpose()?;
                PatternTarget::Contextual { when, otherwise }
            }
            _ => {
                return Err(Error::Config(format!(
                    "{} needs either `intent` or `when` (with optional `otherwise`)",
                    context
                )))
            }
        };

        patterns.push(Pattern { phrase, target });
    }

    let fallback = match raw.fallback {
        Some(f) => Fallback {
            money_words: normalize_list(f.money_words),
            routes: f
                .routes
                .into_iter()
                .map(|r| {
                    Ok(FallbackRoute {
                        intent: parse_intent(&r.intent, "[[fallback.routes]]")?,
                        words: normalize_list(r.words),
                        requires_distress: r.requires_distress,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        },
        None => Fallback::default(),
    };

    let budget = raw
        .budget
        .map(|b| BudgetKeywords {
            needs: normalize_list(b.needs),
            wants: normalize_list(b.wants),
        })
        .unwrap_or_default();

    Ok(Lexicon {
        version: raw.version.unwrap_or(1),
        action_words: normalize_list(raw.action_words),
        distress_markers: normalize_list(raw.distress_markers),
        urgency_markers: normalize_list(raw.urgency_markers),
        informal_markers: normalize_list(raw.informal_markers),
        whole_words,
        scoring,
        intents,
        patterns,
        fallback,
        budget,
    })
}
