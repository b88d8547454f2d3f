//! Clause rules: a category plus the keywords that signal it

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared_types::ClauseCategory;

use crate::error::ClauseError;
use crate::patterns::{self, keyword_regex};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRule {
    /// `termination`, `payment`, `liability`, `privacy`, or `other.<topic>`
    pub id: String,
    pub category: ClauseCategory,
    pub keywords: Vec<String>,
}

impl ClauseRule {
    pub fn new(id: impl Into<String>, category: ClauseCategory, keywords: &[&str]) -> Self {
        Self {
            id: id.into(),
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Category for a rule id: the part before the first `.`
    pub fn category_for_id(id: &str) -> ClauseCategory {
        let head = id.split('.').next().unwrap_or(id);
        ClauseCategory::from_name(head)
    }
}

/// Ordered set of rules applied by the detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRuleSet {
    rules: Vec<ClauseRule>,
}

impl ClauseRuleSet {
    pub fn new(rules: Vec<ClauseRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClauseRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&ClauseRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Replace the keywords of existing rules, or add new rules, from a
    /// `rule id -> keywords` map (the `[clauses]` config table)
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<String>>) -> Self {
        for (id, keywords) in overrides {
            match self.rules.iter_mut().find(|r| &r.id == id) {
                Some(rule) => rule.keywords = keywords.clone(),
                None => self.rules.push(ClauseRule {
                    id: id.clone(),
                    category: ClauseRule::category_for_id(id),
                    keywords: keywords.clone(),
                }),
            }
        }
        self
    }

    pub(crate) fn compile(&self) -> Result<Vec<CompiledRule>, ClauseError> {
        self.rules
            .iter()
            .map(|rule| {
                let keywords: Vec<&String> = rule
                    .keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .collect();
                if keywords.is_empty() {
                    return Err(ClauseError::EmptyRule(rule.id.clone()));
                }

                let patterns = keywords
                    .into_iter()
                    .map(|keyword| {
                        keyword_regex(keyword)
                            .map(|regex| (keyword.trim().to_lowercase(), regex))
                            .map_err(|source| ClauseError::InvalidPattern {
                                rule: rule.id.clone(),
                                keyword: keyword.clone(),
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(CompiledRule {
                    id: rule.id.clone(),
                    category: rule.category,
                    patterns,
                })
            })
            .collect()
    }
}

impl Default for ClauseRuleSet {
    fn default() -> Self {
        Self::new(vec![
            ClauseRule::new(
                "termination",
                ClauseCategory::Termination,
                patterns::TERMINATION_KEYWORDS,
            ),
            ClauseRule::new("payment", ClauseCategory::Payment, patterns::PAYMENT_KEYWORDS),
            ClauseRule::new(
                "liability",
                ClauseCategory::Liability,
                patterns::LIABILITY_KEYWORDS,
            ),
            ClauseRule::new("privacy", ClauseCategory::Privacy, patterns::PRIVACY_KEYWORDS),
            ClauseRule::new(
                "other.confidentiality",
                ClauseCategory::Other,
                patterns::CONFIDENTIALITY_KEYWORDS,
            ),
            ClauseRule::new(
                "other.intellectual_property",
                ClauseCategory::Other,
                patterns::INTELLECTUAL_PROPERTY_KEYWORDS,
            ),
            ClauseRule::new(
                "other.dispute_resolution",
                ClauseCategory::Other,
                patterns::DISPUTE_RESOLUTION_KEYWORDS,
            ),
            ClauseRule::new(
                "other.force_majeure",
                ClauseCategory::Other,
                patterns::FORCE_MAJEURE_KEYWORDS,
            ),
        ])
    }
}

/// A rule with one compiled pattern per keyword
#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub id: String,
    pub category: ClauseCategory,
    pub patterns: Vec<(String, Regex)>,
}
