//! Rule extensions loaded from TOML so deployments can grow a screen's
//! vocabulary without recompiling.
//!
//! Only navigation and speak actions are accepted here; argument-capturing
//! actions stay built-in because they need executor support.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::{IntentRule, Pattern};
use crate::dispatch::Action;

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    screen: String,
    pattern: String,
    #[serde(default)]
    kind: PatternKind,
    intent: String,
    action: RuleAction,
    route: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PatternKind {
    #[default]
    Contains,
    WholeWord,
    Prefix,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RuleAction {
    Navigate,
    Speak,
    GoBack,
}

/// Parse a rules file into (screen, rule) pairs for [`Catalog::extend`].
///
/// [`Catalog::extend`]: super::Catalog::extend
pub fn load_rules_file(path: &Path) -> Result<Vec<(String, IntentRule)>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading rules file {}", path.display()))?;
    let parsed: RulesFile = toml::from_str(&raw)
        .with_context(|| format!("parsing rules file {}", path.display()))?;

    let mut rules = Vec::with_capacity(parsed.rules.len());
    for entry in parsed.rules {
        if entry.pattern.trim().is_empty() {
            bail!("rule for screen {} has an empty pattern", entry.screen);
        }
        let pattern = match entry.kind {
            PatternKind::Contains => Pattern::contains(&entry.pattern),
            PatternKind::WholeWord => Pattern::whole_word(&entry.pattern),
            PatternKind::Prefix => Pattern::prefix(&entry.pattern),
        };
        let action = match entry.action {
            RuleAction::Navigate => {
                let route = entry.route.clone().with_context(|| {
                    format!("navigate rule {} is missing a route", entry.intent)
                })?;
                Action::Navigate { route }
            }
            RuleAction::Speak => {
                let text = entry.text.clone().with_context(|| {
                    format!("speak rule {} is missing its text", entry.intent)
                })?;
                Action::Speak { text }
            }
            RuleAction::GoBack => Action::GoBack,
        };
        rules.push((
            entry.screen.clone(),
            IntentRule::new(pattern, &entry.intent, action),
        ));
    }
    Ok(rules)
}
