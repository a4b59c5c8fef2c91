//! Ingredient text -> allergen token classification
//!
//! Rules are regex-as-data: each catalog entry compiles once into a
//! `(Regex, token)` pair. Matching uses `Regex::is_match`, which carries no
//! per-call position state, so repeated calls against the same rule cannot
//! bleed into each other.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use crate::catalog::NormalizationRule;
use crate::error::{Error, Result};

/// A compiled classification rule
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Regex,
    pub token: String,
}

/// Maps free-text ingredients to allergen tokens
#[derive(Debug, Clone, Default)]
pub struct NormalizationEngine {
    rules: Vec<CompiledRule>,
}

impl NormalizationEngine {
    /// Compile rules in order. Rules with an empty pattern or token are
    /// skipped; a pattern that fails to compile is an error.
    pub fn new(rules: &[NormalizationRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.pattern.is_empty() || rule.token.is_empty() {
                log::debug!("Skipping incomplete normalization rule: {:?}", rule);
                continue;
            }
            compiled.push(compile_rule(rule)?);
        }
        log::info!("Compiled {} normalization rules", compiled.len());
        Ok(Self { rules: compiled })
    }

    /// Number of rules that survived compilation
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Tokens triggered by a single ingredient (substring match per rule)
    pub fn tokens_for_ingredient(&self, text: &str) -> BTreeSet<String> {
        self.rules
            .iter()
            .filter(|rule| rule.regex.is_match(text))
            .map(|rule| rule.token.clone())
            .collect()
    }

    /// Union of tokens over every ingredient of a dish
    pub fn tokens_for_dish_ingredients<S: AsRef<str>>(&self, ingredients: &[S]) -> BTreeSet<String> {
        ingredients
            .iter()
            .flat_map(|i| self.tokens_for_ingredient(i.as_ref()))
            .collect()
    }

    /// Whether an ingredient triggers a specific token
    pub fn ingredient_triggers(&self, text: &str, token: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.token == token && rule.regex.is_match(text))
    }
}

/// Compile one rule, translating JS-style flags to builder options.
/// `g` and `y` only affect match position state, which `is_match` never keeps;
/// `d` only adds match indices; `u` is already the default and `v` class set
/// syntax (`&&`, `--`) is native to `regex`.
fn compile_rule(rule: &NormalizationRule) -> Result<CompiledRule> {
    let mut builder = RegexBuilder::new(&rule.pattern);
    for flag in rule.flags.as_deref().unwrap_or("").chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'u' | 'v' | 'g' | 'y' | 'd' => {}
            other => {
                return Err(Error::UnsupportedFlag {
                    flag: other,
                    token: rule.token.clone(),
                });
            }
        }
    }

    let regex = builder.build().map_err(|source| Error::InvalidPattern {
        pattern: rule.pattern.clone(),
        token: rule.token.clone(),
        source,
    })?;

    Ok(CompiledRule {
        regex,
        token: rule.token.clone(),
    })
}
