//! Declarative intent rules and the first-match-wins transcript matcher.
//!
//! Every screen owns an ordered rule list. Matching is pure and stateless:
//! the first rule whose pattern accepts the normalized transcript wins, so
//! overlapping vocabularies ("note" inside "delete note") are resolved by
//! declaration order rather than scattered `if` chains. The policy per rule
//! is explicit: substring containment, whole-word, prefix capture, or a
//! predicate.

mod catalog;
mod rules_file;

use regex::Regex;
use tracing::warn;

use crate::dispatch::Action;

pub use catalog::Catalog;
pub use rules_file::load_rules_file;

/// Matching policy for one rule.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Substring containment, the app's default policy.
    Contains(String),
    /// Word-bounded match so short commands do not fire inside longer words.
    WholeWord(Regex),
    /// Leading keyword; the remainder of the transcript is the argument.
    Prefix(String),
    /// Arbitrary predicate over the normalized transcript.
    Predicate(fn(&str) -> bool),
}

impl Pattern {
    #[must_use]
    pub fn contains(needle: &str) -> Self {
        Pattern::Contains(needle.to_lowercase())
    }

    #[must_use]
    pub fn prefix(keyword: &str) -> Self {
        Pattern::Prefix(keyword.trim().to_lowercase())
    }

    /// Build a word-bounded pattern. Escaped literals always compile; if
    /// compilation fails anyway the rule degrades to containment.
    #[must_use]
    pub fn whole_word(word: &str) -> Self {
        let escaped = regex::escape(&word.trim().to_lowercase());
        match Regex::new(&format!(r"\b{escaped}\b")) {
            Ok(re) => Pattern::WholeWord(re),
            Err(err) => {
                warn!(word, %err, "whole-word pattern fell back to containment");
                Pattern::contains(word)
            }
        }
    }

    /// Evaluate against a normalized transcript. `Some` carries the
    /// captured argument for prefix rules, empty for the other kinds.
    #[must_use]
    fn evaluate(&self, normalized: &str) -> Option<Option<String>> {
        match self {
            Pattern::Contains(needle) => normalized.contains(needle.as_str()).then(|| None),
            Pattern::WholeWord(re) => re.is_match(normalized).then(|| None),
            Pattern::Prefix(keyword) => {
                if normalized == keyword {
                    return Some(Some(String::new()));
                }
                let rest = normalized.strip_prefix(keyword.as_str())?;
                let rest = rest.strip_prefix(' ')?;
                Some(Some(rest.trim().to_string()))
            }
            Pattern::Predicate(pred) => pred(normalized).then(|| None),
        }
    }
}

/// One (pattern, intent, action) row of a screen's vocabulary.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub pattern: Pattern,
    pub intent: String,
    pub action: Action,
}

impl IntentRule {
    #[must_use]
    pub fn new(pattern: Pattern, intent: &str, action: Action) -> Self {
        Self {
            pattern,
            intent: intent.to_string(),
            action,
        }
    }
}

/// A winning rule plus its captured argument.
#[derive(Debug, Clone)]
pub struct MatchedIntent<'a> {
    pub intent: &'a str,
    pub action: &'a Action,
    pub argument: Option<String>,
}

/// Ordered vocabulary for one screen.
#[derive(Debug, Clone)]
pub struct RuleSet {
    screen: String,
    welcome_prompt: String,
    rules: Vec<IntentRule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(screen: &str, welcome_prompt: &str) -> Self {
        Self {
            screen: screen.to_string(),
            welcome_prompt: welcome_prompt.to_string(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, pattern: Pattern, intent: &str, action: Action) -> Self {
        self.rules.push(IntentRule::new(pattern, intent, action));
        self
    }

    pub fn push(&mut self, rule: IntentRule) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn screen(&self) -> &str {
        &self.screen
    }

    #[must_use]
    pub fn welcome_prompt(&self) -> &str {
        &self.welcome_prompt
    }

    #[must_use]
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// First matching rule in declaration order, or `None`.
    #[must_use]
    pub fn match_transcript(&self, normalized: &str) -> Option<MatchedIntent<'_>> {
        if normalized.is_empty() {
            return None;
        }
        self.rules.iter().find_map(|rule| {
            rule.pattern.evaluate(normalized).map(|argument| {
                // Prefix captures carry an argument; an empty capture is
                // surfaced as None so executors see one miss shape.
                let argument = argument.filter(|arg| !arg.is_empty());
                MatchedIntent {
                    intent: &rule.intent,
                    action: &rule.action,
                    argument,
                }
            })
        })
    }
}
