//! Per-account statistics and feedback term ranking.
//!
//! Everything here is a pure function of the fetched records: no store
//! access, no I/O, and no state kept between calls.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{InsightsError, Result};
use crate::models::{AccountInsight, BusinessRecord, ScoreSummary, TermCount};

/// Number of ranked terms kept per feedback field by default
pub const DEFAULT_TOP_TERMS: usize = 3;

/// Computes an [`AccountInsight`] from one account's records
pub struct InsightAggregator {
    word_regex: Regex,
    top_terms: usize,
}

impl InsightAggregator {
    /// Create an aggregator keeping `top_terms` ranked terms per field
    pub fn new(top_terms: usize) -> Result<Self> {
        let word_regex = Regex::new(r"\w+")
            .map_err(|e| InsightsError::Other(format!("Failed to compile word regex: {e}")))?;

        Ok(Self {
            word_regex,
            top_terms,
        })
    }

    /// Aggregate a record set. Returns `None` for an empty set.
    #[must_use]
    pub fn aggregate(&self, records: &[BusinessRecord]) -> Option<AccountInsight> {
        let first = records.first()?;

        let mut rated = records.iter().filter_map(|r| r.rating().map(|rating| (r, rating)));
        let (avg_rating, highest_rated, lowest_rated) = match rated.next() {
            None => (None, None, None),
            Some((record, rating)) => {
                let (mut highest, mut lowest) = ((record, rating), (record, rating));
                let mut sum = rating;
                let mut count = 1_usize;

                for (record, rating) in rated {
                    sum += rating;
                    count += 1;
                    // Strict comparisons keep the earliest record on ties
                    if rating > highest.1 {
                        highest = (record, rating);
                    }
                    if rating < lowest.1 {
                        lowest = (record, rating);
                    }
                }

                #[allow(clippy::cast_precision_loss)]
                let mean = sum / count as f64;
                (Some(mean), Some(highest.0.clone()), Some(lowest.0.clone()))
            }
        };

        let strengths = join_present(records.iter().map(|r| r.strengths.as_deref()));
        let areas = join_present(records.iter().map(|r| r.areas_for_improvement.as_deref()));

        Some(AccountInsight {
            name: first.name.clone(),
            records: records.to_vec(),
            avg_rating,
            highest_rated,
            lowest_rated,
            top_strengths: self.top_terms(&strengths),
            top_improvement_areas: self.top_terms(&areas),
            csat: summarize(records.iter().map(|r| r.csat)),
            nps: summarize(records.iter().map(|r| r.nps)),
        })
    }

    /// How many ranked terms are kept per field
    #[must_use]
    pub const fn term_limit(&self) -> usize {
        self.top_terms
    }

    /// The most frequent terms of `text`, at most `top_terms` of them
    #[must_use]
    pub fn top_terms(&self, text: &str) -> Vec<TermCount> {
        let mut ranked = self.tally_terms(text);
        ranked.truncate(self.top_terms);
        ranked
    }

    /// Every distinct term of `text`, by count descending then first appearance
    #[must_use]
    pub fn tally_terms(&self, text: &str) -> Vec<TermCount> {
        let lowered = text.to_lowercase();
        let mut order: Vec<TermCount> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for m in self.word_regex.find_iter(&lowered) {
            let term = m.as_str();
            if let Some(&i) = index.get(term) {
                order[i].count += 1;
            } else {
                index.insert(term, order.len());
                order.push(TermCount {
                    term: term.to_string(),
                    count: 1,
                });
            }
        }

        // Stable sort keeps first-appearance order among equal counts
        order.sort_by(|a, b| b.count.cmp(&a.count));
        order
    }
}

impl Default for InsightAggregator {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(DEFAULT_TOP_TERMS).expect("word pattern compiles")
    }
}

/// Aggregate with the default term count
#[must_use]
pub fn aggregate(records: &[BusinessRecord]) -> Option<AccountInsight> {
    InsightAggregator::default().aggregate(records)
}

/// Space-join the non-empty values, keeping record order
fn join_present<'a>(values: impl Iterator<Item = Option<&'a str>>) -> String {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn summarize(values: impl Iterator<Item = Option<f64>>) -> Option<ScoreSummary> {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return None;
    }

    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    #[allow(clippy::cast_precision_loss)]
    let mean = present.iter().sum::<f64>() / present.len() as f64;

    Some(ScoreSummary {
        mean,
        min,
        max,
        samples: present.len(),
    })
}
