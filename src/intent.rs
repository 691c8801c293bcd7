// src/intent.rs
//! Best-effort request classification: is this a research / account-plan
//! request, and which company does it name. Heuristic by nature; swap the
//! strategy out rather than hardening it.

use once_cell::sync::Lazy;
use regex::Regex;

pub trait CompanyNameExtractor: Send + Sync {
    /// Candidate company name in `text`, if any.
    fn extract(&self, text: &str) -> Option<String>;
}

const RESEARCH_KEYWORDS: &[&str] = &[
    "research",
    "analyze",
    "study",
    "look up",
    "find info",
    "tell me about",
    "generate account plan",
    "create account plan",
    "make account plan",
    "build account plan",
];

/// Longer phrases first so "account plan for" wins over "research".
const EXTRACTION_KEYWORDS: &[&str] = &[
    "generate account plan",
    "create account plan",
    "make account plan",
    "build account plan",
    "account plan for",
    "tell me about",
    "research on",
    "analyze on",
    "find info",
    "look up",
    "research",
    "analyze",
    "study",
];

const PLAN_KEYWORDS: &[&str] = &[
    "account plan",
    "generate plan",
    "create plan",
    "make plan",
    "build plan",
    "business plan",
    "strategy plan",
];

const GIBBERISH_PATTERNS: &[&str] = &[
    "asdf", "jkl", "qwerty", "zxcv", "lorem", "ipsum", "dolor", "amet", "foo", "baz",
];

const FILLER_WORDS: &[&str] = &["the", "a", "an", "about", "on", "for", "and", "but", "anyway"];

/// Words that end a candidate name ("research Acme my cousin works at").
const STOP_MARKERS: &[&str] = &["my", "i", "we", "you", "anyway", "what", "were"];

const VAGUE_PHRASES: &[&str] = &[
    "something about",
    "some companies",
    "any company",
    "a company",
    "companies in general",
    "business in general",
    "tell me about companies",
    "research companies",
];

const MEANINGLESS_PHRASES: &[&str] = &[
    "from my dreams",
    "from my imagination",
    "some company",
    "any company",
];

const FALLBACK_DROP_WORDS: &[&str] = &[
    "the", "a", "an", "about", "on", "for", "something", "companies", "business", "from", "my",
    "company", "corporation", "anyway", "what", "were", "doing", "me", "tell", "please", "can",
    "you", "info", "look", "up", "find",
];

static RE_REPEAT4: Lazy<Regex> = Lazy::new(|| {
    // regex has no backreferences; four identical letters/digits in a row.
    let alts: Vec<String> = ('a'..='z')
        .chain('0'..='9')
        .map(|c| format!("{c}{{4}}"))
        .collect();
    Regex::new(&alts.join("|")).expect("repeat regex")
});

/// Keyboard mashing, lorem ipsum, long runs of one character, or words with a
/// wildly unbalanced vowel/consonant mix.
pub fn contains_gibberish(text: &str) -> bool {
    let lower = text.to_lowercase();
    if RE_REPEAT4.is_match(&lower) {
        return true;
    }
    if GIBBERISH_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }
    for word in lower.split_whitespace() {
        let letters: Vec<char> = word.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if letters.len() > 3 {
            let vowels = letters.iter().filter(|c| "aeiou".contains(**c)).count();
            let consonants = letters.len() - vowels;
            if consonants > vowels * 2 + 1 || vowels > consonants * 2 + 1 {
                return true;
            }
        }
    }
    false
}

pub fn is_valid_company_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    let len = name.chars().count();
    if !(2..=50).contains(&len) || contains_gibberish(name) {
        return false;
    }
    !MEANINGLESS_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_research_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    RESEARCH_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn is_account_plan_request(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLAN_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn title_case(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(c) => c.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn trim_punct(w: &str) -> &str {
    w.trim_matches(|c: char| !c.is_alphanumeric() && c != '&' && c != '-')
}

/// Keyword-driven extractor mirroring what a chat UI does before research.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordExtractor;

impl KeywordExtractor {
    fn after_keyword(lower: &str) -> Option<String> {
        for kw in EXTRACTION_KEYWORDS {
            let Some(pos) = lower.find(kw) else { continue };
            let mut picked: Vec<&str> = Vec::new();
            for raw in lower[pos + kw.len()..].split_whitespace() {
                let w = trim_punct(raw);
                if STOP_MARKERS.contains(&w) {
                    break;
                }
                if FILLER_WORDS.contains(&w) || w.chars().count() < 2 || contains_gibberish(w) {
                    continue;
                }
                picked.push(w);
                if raw.ends_with(['?', '.', '!', ',']) {
                    break;
                }
            }
            if !picked.is_empty() {
                let name = title_case(&picked);
                if is_valid_company_name(&name) {
                    return Some(name);
                }
            }
        }
        None
    }

    fn fallback(lower: &str) -> Option<String> {
        let words: Vec<&str> = lower
            .split_whitespace()
            .map(trim_punct)
            .filter(|w| {
                w.chars().count() > 1
                    && !FALLBACK_DROP_WORDS.contains(w)
                    && !RESEARCH_KEYWORDS.contains(w)
                    && !w.chars().all(|c| c.is_ascii_digit())
                    && !contains_gibberish(w)
            })
            .collect();
        let name = title_case(&words);
        (name.chars().count() >= 2 && is_valid_company_name(&name)).then_some(name)
    }
}

impl CompanyNameExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        if let Some(name) = Self::after_keyword(&lower) {
            return Some(name);
        }
        if VAGUE_PHRASES.iter().any(|p| lower.contains(p)) {
            return None;
        }
        Self::fallback(&lower)
    }
}
