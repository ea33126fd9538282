//! Understanding stage: turns raw text into coarse, structured intent.
//!
//! Nothing downstream looks at the raw text again; the record built here is
//! the only input later stages reason about.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::record::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Build,
    Fix,
    Explain,
    Decide,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Target {
    Code,
    System,
    Architecture,
    Data,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Clarity {
    High,
    Medium,
    Low,
}

impl Clarity {
    /// `high` iff both action and target were identified, `low` iff the
    /// action fell back to `ask`, `medium` otherwise.
    pub fn derive(action: Action, target: Target) -> Self {
        match (action, target) {
            (Action::Ask, _) => Self::Low,
            (_, Target::Unknown) => Self::Medium,
            _ => Self::High,
        }
    }
}

/// Coarse script family of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Language {
    Telugu,
    English,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: Action,
    pub target: Target,
    pub clarity: Clarity,
}

impl Intent {
    pub fn from_signals(action: Action, target: Target) -> Self {
        Self {
            action,
            target,
            clarity: Clarity::derive(action, target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderstandMeta {
    /// Length of the normalized text in characters.
    pub length: usize,
    pub empty: bool,
    /// Unix milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderstandRecord {
    pub raw: String,
    pub normalized: String,
    pub language: Language,
    pub intent: Intent,
    pub meta: UnderstandMeta,
}

struct KeywordRule<T> {
    label: T,
    english: Regex,
    telugu: &'static [&'static str],
}

impl<T: Copy> KeywordRule<T> {
    fn new(label: T, english: &[&str], telugu: &'static [&'static str]) -> Self {
        let alternation = english
            .iter()
            .map(|word| word.replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        // Patterns are compile-time constants; a failure here is a programming error.
        let english = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))
            .unwrap_or_else(|e| panic!("invalid keyword pattern: {e}"));
        Self {
            label,
            english,
            telugu,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.english.is_match(text) || self.telugu.iter().any(|word| text.contains(word))
    }
}

fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str, fallback: T) -> T {
    rules
        .iter()
        .find(|rule| rule.matches(text))
        .map_or(fallback, |rule| rule.label)
}

// Telugu words inflect by suffix, so they match as substrings of stems.
static ACTION_RULES: LazyLock<Vec<KeywordRule<Action>>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(
            Action::Build,
            &["build", "create", "generate", "make", "develop"],
            &["నిర్మించు", "తయారు", "సృష్టించు", "రూపొందించు"],
        ),
        KeywordRule::new(
            Action::Fix,
            &["fix", "debug", "solve", "repair", "error"],
            &["సరిచేయ", "సరిదిద్దు", "పరిష్కరించు", "లోపం", "తప్పు"],
        ),
        KeywordRule::new(
            Action::Explain,
            &["explain", "why", "how", "what is", "define"],
            &["వివరించు", "ఎందుకు", "ఎలా", "అంటే ఏమిటి", "గురించి"],
        ),
        KeywordRule::new(
            Action::Decide,
            &["compare", "decide", "choose", "better"],
            &["పోల్చు", "ఎంచుకో", "మంచిది", "నిర్ణయించు"],
        ),
    ]
});

static TARGET_RULES: LazyLock<Vec<KeywordRule<Target>>> = LazyLock::new(|| {
    vec![
        KeywordRule::new(
            Target::Code,
            &["code", "program", "script", "function", "class"],
            &["కోడ్", "ప్రోగ్రామ్", "స్క్రిప్ట్"],
        ),
        KeywordRule::new(
            Target::System,
            &["app", "application", "software", "system", "tool"],
            &["యాప్", "అప్లికేషన్", "సాఫ్ట్", "సిస్టమ్", "టూల్"],
        ),
        KeywordRule::new(
            Target::Architecture,
            &["architecture", "design", "structure"],
            &["ఆర్కిటెక్చర్", "డిజైన్", "నిర్మాణం"],
        ),
        KeywordRule::new(
            Target::Data,
            &["data", "database", "file", "storage"],
            &["డేటా", "ఫైల్", "నిల్వ"],
        ),
    ]
});

/// Unicode whitespace plus the byte-order mark, which editors and clipboards
/// leave at the start of pasted text.
pub fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// Collapse whitespace runs to a single space and trim the ends.
pub fn normalize(raw: &str) -> String {
    raw.split(is_blank)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_telugu(c: char) -> bool {
    ('\u{0C00}'..='\u{0C7F}').contains(&c)
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (('\u{00C0}'..='\u{024F}').contains(&c) && c.is_alphabetic())
}

pub fn detect_language(text: &str) -> Language {
    let telugu = text.chars().any(is_telugu);
    let latin = text.chars().any(is_latin_letter);
    match (telugu, latin) {
        (true, true) => Language::Mixed,
        (true, false) => Language::Telugu,
        _ => Language::English,
    }
}

pub fn detect_action(text: &str) -> Action {
    first_match(&ACTION_RULES, text, Action::Ask)
}

pub fn detect_target(text: &str) -> Target {
    first_match(&TARGET_RULES, text, Target::Unknown)
}

/// Build the understanding record for `raw`. Never fails.
pub fn process(raw: &str) -> UnderstandRecord {
    let normalized = normalize(raw);
    let action = detect_action(&normalized);
    let target = detect_target(&normalized);
    let length = normalized.chars().count();

    tracing::debug!(
        stage = "understand",
        %action,
        %target,
        length,
        "input understood"
    );

    UnderstandRecord {
        raw: raw.to_string(),
        language: detect_language(&normalized),
        intent: Intent::from_signals(action, target),
        meta: UnderstandMeta {
            length,
            empty: length == 0,
            timestamp: now_millis(),
        },
        normalized,
    }
}
