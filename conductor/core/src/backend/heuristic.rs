//! Heuristic Backend
//!
//! Deterministic, offline last resort. The output is rough: sentence picks
//! for summaries, keyword-ranked sentences for bullets, and whitespace / "i"
//! fixes for proofreading. Always available.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::traits::{CapabilityStatus, ProviderEvents, TransformBackend};
use crate::request::{TransformKind, TransformationRequest};

const BULLET_COUNT: usize = 5;

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "could", "does", "from", "have",
    "into", "just", "more", "most", "much", "only", "other", "over", "same", "some", "such",
    "than", "that", "their", "them", "then", "there", "these", "they", "this", "those",
    "very", "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

/// Rule-based backend with no model behind it
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicBackend;

impl HeuristicBackend {
    /// Create the backend
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run a transformation synchronously
    #[must_use]
    pub fn transform(kind: TransformKind, text: &str) -> String {
        match kind {
            TransformKind::Summarize => summarize(text),
            TransformKind::Refine => refine(text),
            TransformKind::Proofread => proofread(text),
        }
    }
}

#[async_trait]
impl TransformBackend for HeuristicBackend {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn probe(&self) -> CapabilityStatus {
        CapabilityStatus::Available
    }

    async fn execute(
        &self,
        request: &TransformationRequest,
        _events: &ProviderEvents,
    ) -> anyhow::Result<String> {
        Ok(Self::transform(request.kind, request.input_text()))
    }
}

/// Split text into trimmed sentences, keeping terminal punctuation
fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            current.push(' ');
        } else {
            current.push(c);
        }
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary || (c == '\n' && chars.peek() == Some(&'\n')) {
            let sentence = normalize_whitespace(&current);
            if !sentence.is_empty() {
                out.push(sentence);
            }
            current.clear();
        }
    }

    let rest = normalize_whitespace(&current);
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn bullets<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn summarize(text: &str) -> String {
    bullets(sentences(text).iter().take(BULLET_COUNT))
}

fn keywords(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

/// Pick the sentences with the most frequent keywords, in original order
fn refine(text: &str) -> String {
    let all = sentences(text);

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for sentence in &all {
        for word in keywords(sentence) {
            *frequency.entry(word).or_default() += 1;
        }
    }

    let mut scored: Vec<(usize, usize)> = all
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let unique: HashSet<String> = keywords(sentence).collect();
            let score = unique.iter().map(|w| frequency.get(w).copied().unwrap_or(0)).sum();
            (i, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut picked: Vec<usize> = scored.into_iter().take(BULLET_COUNT).map(|(i, _)| i).collect();
    picked.sort_unstable();

    bullets(picked.iter().map(|&i| &all[i]))
}

/// Capitalise the pronoun "i" and its contractions, ignoring punctuation
/// around the word
fn fix_pronoun(token: &str) -> String {
    let is_edge = |c: char| c.is_ascii_punctuation() && c != '\'';
    let word = token.trim_matches(is_edge);
    let is_pronoun = word == "i"
        || word
            .strip_prefix("i'")
            .is_some_and(|rest| ["m", "d", "ll", "ve"].contains(&rest));
    if !is_pronoun {
        return token.to_string();
    }

    let start = token.len() - token.trim_start_matches(is_edge).len();
    let mut fixed = token.to_string();
    fixed.replace_range(start..=start, "I");
    fixed
}

/// Numbered, normalised rendering: one output line per input line
fn proofread(text: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let fixed: Vec<String> = line.split_whitespace().map(fix_pronoun).collect();
            format!("{}. {}", i + 1, fixed.join(" ")).trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
