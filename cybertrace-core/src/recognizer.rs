//! Contextual entity recognition
//!
//! Recovers actor and targeted-entity names that are absent from the fixed
//! vocabularies. Only sentences containing a trigger keyword are examined;
//! the trigger requirement is a precision filter that keeps named entities
//! mentioned outside a threat context (the publishing organization's own
//! name, for instance) out of the results. Within a triggering sentence a
//! heuristic named-entity pass collects capitalized spans, organization-
//! suffixed spans, and identifier-style names such as `APT29`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Tunable knobs of the recognizer. The benign-term denylist is a
/// configuration parameter, not a set of inline literals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Keywords marking a sentence as actor context
    pub actor_triggers: Vec<String>,
    /// Keywords marking a sentence as target context
    pub target_triggers: Vec<String>,
    /// Terms indicating a legitimate organization; actor spans containing
    /// one are discarded
    pub benign_terms: Vec<String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        fn owned(words: &[&str]) -> Vec<String> {
            words.iter().map(|w| w.to_string()).collect()
        }
        Self {
            actor_triggers: owned(&["threat actor", "group", "team", "cyber", "espionage"]),
            target_triggers: owned(&[
                "target", "victim", "industry", "sector", "organization", "entities",
            ]),
            benign_terms: owned(&["research", "intelligence", "corporation"]),
        }
    }
}

/// Candidate spans recovered from triggering sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedEntities {
    pub actors: HashSet<String>,
    pub targets: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanLabel {
    /// Ends with an organization designator (Corp, Ministry, ...)
    Organization,
    /// Identifier-style name: APT29, FIN7, UNC1878
    Identifier,
    /// Run of capitalized words
    ProperName,
}

struct Span {
    text: String,
    label: SpanLabel,
    starts_sentence: bool,
}

const ORG_SUFFIXES: &[&str] = &[
    "Inc", "Corp", "Ltd", "LLC", "Group", "Foundation", "University", "Institute", "Agency",
    "Commission", "Ministry", "Department", "Authority",
];

// Capitalized function words that open sentences but never name anything.
const CAPITALIZED_STOPWORDS: &[&str] = &[
    "The", "A", "An", "This", "That", "These", "Those", "It", "In", "On", "At", "By", "For",
    "From", "With", "As", "After", "Before", "During", "Since", "While", "However", "According",
    "We", "They", "Our", "Their", "Its", "He", "She",
];

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](?:\s+|$)").unwrap());

static IDENTIFIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,}-?[0-9]+$").unwrap());

/// Longest span the heuristic will keep; longer runs are almost always
/// headline fragments rather than names.
const MAX_SPAN_TOKENS: usize = 4;

pub struct ContextualRecognizer {
    config: RecognizerConfig,
}

impl ContextualRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Run the trigger-gated entity pass over a whole document.
    pub fn recognize(&self, text: &str) -> RecognizedEntities {
        let mut recognized = RecognizedEntities::default();

        for sentence in SENTENCE_BOUNDARY.split(text) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            let lower = sentence.to_lowercase();
            let actor_context = self.config.actor_triggers.iter().any(|t| lower.contains(t));
            let target_context = self.config.target_triggers.iter().any(|t| lower.contains(t));
            if !actor_context && !target_context {
                continue;
            }

            for span in scan_spans(sentence) {
                if actor_context && self.is_actor_candidate(&span) {
                    recognized.actors.insert(span.text.clone());
                }
                if target_context && self.is_target_candidate(&span) {
                    recognized.targets.insert(span.text.clone());
                }
            }
        }

        recognized
    }

    fn is_actor_candidate(&self, span: &Span) -> bool {
        // A lone capitalized word at the sentence start is usually just
        // sentence case, unless it is identifier-style.
        if span.starts_sentence
            && span.label == SpanLabel::ProperName
            && !span.text.contains(' ')
        {
            return false;
        }
        let lower = span.text.to_lowercase();
        !self.config.benign_terms.iter().any(|term| lower.contains(term))
    }

    fn is_target_candidate(&self, span: &Span) -> bool {
        match span.label {
            SpanLabel::Organization => true,
            SpanLabel::ProperName => {
                !(span.starts_sentence && !span.text.contains(' '))
            }
            // Identifier-style names read as actors, not victims.
            SpanLabel::Identifier => false,
        }
    }
}

impl Default for ContextualRecognizer {
    fn default() -> Self {
        Self::new(RecognizerConfig::default())
    }
}

/// Collect maximal runs of name-like tokens from one sentence.
fn scan_spans(sentence: &str) -> Vec<Span> {
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    let mut spans = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 0usize;

    for (idx, raw) in tokens.iter().enumerate() {
        let token = trim_token(raw);
        let boundary = raw.ends_with([',', ';', ':', ')']);
        if !token.is_empty() && is_name_token(token) {
            if run.is_empty() {
                run_start = idx;
            }
            run.push(token);
            if boundary || run.len() == MAX_SPAN_TOKENS {
                flush_run(&mut spans, &mut run, run_start);
            }
        } else {
            flush_run(&mut spans, &mut run, run_start);
        }
    }
    flush_run(&mut spans, &mut run, run_start);
    spans
}

fn flush_run(spans: &mut Vec<Span>, run: &mut Vec<&str>, run_start: usize) {
    if run.is_empty() {
        return;
    }
    // Leading function words are not part of the name.
    let skip = run
        .iter()
        .take_while(|t| CAPITALIZED_STOPWORDS.contains(*t))
        .count();
    let tokens = &run[skip..];
    let starts_sentence = run_start == 0 && skip == 0;

    if !tokens.is_empty() && !is_bare_org_suffix(tokens) {
        let label = if ORG_SUFFIXES.contains(tokens.last().unwrap_or(&"")) {
            SpanLabel::Organization
        } else if tokens.iter().any(|t| IDENTIFIER_TOKEN.is_match(t)) {
            SpanLabel::Identifier
        } else {
            SpanLabel::ProperName
        };
        spans.push(Span {
            text: tokens.join(" "),
            label,
            starts_sentence,
        });
    }
    run.clear();
}

/// A run that is nothing but an organization designator ("Group", "Agency")
/// names no one.
fn is_bare_org_suffix(tokens: &[&str]) -> bool {
    tokens.len() == 1 && ORG_SUFFIXES.contains(&tokens[0])
}

fn trim_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}

fn is_name_token(token: &str) -> bool {
    if IDENTIFIER_TOKEN.is_match(token) {
        return true;
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '&' || c == '\'')
        }
        _ => false,
    }
}
