//! Clause detection over extracted document text
//!
//! Keyword rules flag termination, payment, liability, privacy and other
//! notable clauses. Every keyword hit is widened to its sentence, and the
//! offsets of the result refer to the text the detector was given.

pub mod error;
pub mod extractors;
pub mod insights;
pub mod patterns;
pub mod risk;
pub mod rules;

pub use error::ClauseError;
pub use rules::{ClauseRule, ClauseRuleSet};

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::text::sentence_span;
use shared_types::{ClauseCategory, ClauseMatch, Deadline, Span};
use tracing::debug;

use crate::rules::CompiledRule;

/// Everything the detector finds in one text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub clauses: Vec<ClauseMatch>,
    pub deadlines: Vec<Deadline>,
    pub insights: Vec<String>,
}

/// ClauseDetector entry point
#[derive(Debug)]
pub struct ClauseDetector {
    rules: Vec<CompiledRule>,
}

/// Best hit so far for one (sentence, category, rule group) key
struct Candidate<'a> {
    rule_id: &'a str,
    keyword: &'a str,
    keyword_span: Span,
    found: Vec<(usize, &'a str)>,
}

impl ClauseDetector {
    pub fn new(rules: ClauseRuleSet) -> Result<Self, ClauseError> {
        Ok(Self {
            rules: rules.compile()?,
        })
    }

    /// Find clause sentences in `text`, ordered by
    /// `(span.start, category, keyword_span.start, rule_id)`
    pub fn detect(&self, text: &str) -> Vec<ClauseMatch> {
        let mut grouped: BTreeMap<(Span, ClauseCategory, &str), Candidate<'_>> = BTreeMap::new();

        for rule in &self.rules {
            // The fixed categories collapse per sentence; each `other.*` rule
            // names a distinct kind of clause and keeps its own match
            let group = match rule.category {
                ClauseCategory::Other => rule.id.as_str(),
                _ => "",
            };
            for (keyword, regex) in &rule.patterns {
                for m in regex.find_iter(text) {
                    let keyword_span = Span::new(m.start(), m.end());
                    let mut sentence = sentence_span(text, m.start());
                    if !sentence.contains(&keyword_span) {
                        // Phrase broken across a paragraph break
                        sentence = Span::new(
                            sentence.start.min(keyword_span.start),
                            sentence.end.max(keyword_span.end),
                        );
                    }

                    match grouped.entry((sentence, rule.category, group)) {
                        Entry::Vacant(slot) => {
                            slot.insert(Candidate {
                                rule_id: &rule.id,
                                keyword,
                                keyword_span,
                                found: vec![(keyword_span.start, keyword.as_str())],
                            });
                        }
                        Entry::Occupied(mut slot) => {
                            let best = slot.get_mut();
                            best.found.push((keyword_span.start, keyword.as_str()));
                            let longer = keyword_span.len() > best.keyword_span.len();
                            let tie_earlier = keyword_span.len() == best.keyword_span.len()
                                && keyword_span.start < best.keyword_span.start;
                            if longer || tie_earlier {
                                best.rule_id = &rule.id;
                                best.keyword = keyword;
                                best.keyword_span = keyword_span;
                            }
                        }
                    }
                }
            }
        }

        let mut matches: Vec<ClauseMatch> = grouped
            .into_iter()
            .map(|((span, category, _), mut candidate)| {
                candidate.found.sort();
                let mut keywords_found: Vec<String> = Vec::new();
                for (_, keyword) in candidate.found {
                    if !keywords_found.iter().any(|k| k == keyword) {
                        keywords_found.push(keyword.to_string());
                    }
                }

                let sentence = &text[span.start..span.end];
                ClauseMatch {
                    category,
                    rule_id: candidate.rule_id.to_string(),
                    keyword: candidate.keyword.to_string(),
                    keywords_found,
                    keyword_span: candidate.keyword_span,
                    span,
                    text: sentence.to_string(),
                    risk: risk::assess_risk(sentence),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            (a.span.start, a.category, a.keyword_span.start, &a.rule_id).cmp(&(
                b.span.start,
                b.category,
                b.keyword_span.start,
                &b.rule_id,
            ))
        });

        debug!(clause_count = matches.len(), "Clause detection complete");
        matches
    }

    /// Clauses plus deadlines and summary insights
    pub fn analyze(&self, text: &str) -> ClauseAnalysis {
        let clauses = self.detect(text);
        let deadlines = extractors::extract_deadlines(text);
        let insights = insights::generate_insights(&clauses, &deadlines);

        debug!(
            clauses = clauses.len(),
            deadlines = deadlines.len(),
            insights = insights.len(),
            "Clause analysis complete"
        );

        ClauseAnalysis {
            clauses,
            deadlines,
            insights,
        }
    }
}
