//! Duplicate (entity, date) key detection.

use std::collections::HashMap;

use chrono::NaiveDate;
use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "duplicate_key";

/// Flags keys that appear on more than one row. One anomaly per duplicated
/// key, with the occurrence count.
pub struct DuplicateKeyRule;

fn collect<'a, I>(pairs: I) -> Vec<(String, Option<NaiveDate>, usize)>
where
    I: Iterator<Item = (&'a str, Option<NaiveDate>)>,
{
    // Insertion-ordered so anomaly output follows row order.
    let mut counts: HashMap<(String, Option<NaiveDate>), usize> = HashMap::new();
    let mut order: Vec<(String, Option<NaiveDate>)> = Vec::new();

    for (entity, date) in pairs {
        if entity.is_empty() || date.is_none() {
            // Incomplete keys are the completeness rule's concern.
            continue;
        }
        let key = (entity.to_string(), date);
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|key| {
            let count = counts[&key];
            (count > 1).then(|| (key.0, key.1, count))
        })
        .collect()
}

impl Rule for DuplicateKeyRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, _kind: TableKind) -> bool {
        true
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let duplicated = match slice {
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => {
                collect(rows.iter().map(|r| (r.symbol.as_str(), r.date)))
            }
            DataSlice::DailyPrices(rows) => {
                collect(rows.iter().map(|r| (r.symbol.as_str(), r.date)))
            }
            DataSlice::Dividends(rows) => {
                collect(rows.iter().map(|r| (r.symbol.as_str(), r.date)))
            }
            DataSlice::Filings(rows) => collect(rows.iter().map(|r| {
                (
                    r.tickers.first().map(|s| s.as_str()).unwrap_or(""),
                    r.date(),
                )
            })),
            DataSlice::StockSplits(rows) => {
                collect(rows.iter().map(|r| (r.symbol.as_str(), r.date)))
            }
        };

        Ok(duplicated
            .into_iter()
            .map(|(entity, date, count)| Anomaly {
                rule: RULE_NAME.to_string(),
                severity: Severity::Warning,
                entity: Some(entity.clone()),
                date: ctx.anomaly_date(date),
                message: format!(
                    "{entity}: {count} rows share the key ({entity}, {})",
                    date.map(|d| d.to_string()).unwrap_or_default()
                ),
                observed: Some(count as f64),
                expected: Some(1.0),
            })
            .collect())
    }
}
