//! Stock split timing: repeated splits for one symbol within two weeks.

use idxwatch_core::{Anomaly, DataSlice, Severity, StockSplitRow, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "stock_split_proximity";

/// Flags consecutive splits for the same symbol spaced `max_gap_days` or
/// fewer apart, usually a duplicated corporate-action record.
pub struct SplitProximityRule {
    pub max_gap_days: i64,
}

impl Default for SplitProximityRule {
    fn default() -> Self {
        Self { max_gap_days: 14 }
    }
}

impl Rule for SplitProximityRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::StockSplits
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::StockSplits(rows) = slice else {
            return Ok(Vec::new());
        };

        let mut symbols: Vec<&str> = Vec::new();
        for row in rows {
            if !row.symbol.is_empty() && !symbols.contains(&row.symbol.as_str()) {
                symbols.push(row.symbol.as_str());
            }
        }

        let mut anomalies = Vec::new();
        for symbol in symbols {
            let mut series: Vec<&StockSplitRow> = rows
                .iter()
                .filter(|r| r.symbol == symbol && r.date.is_some())
                .collect();
            series.sort_by_key(|r| r.date);

            for pair in series.windows(2) {
                let (first, second) = (pair[0], pair[1]);
                let (Some(first_date), Some(second_date)) = (first.date, second.date) else {
                    continue;
                };
                let gap = (second_date - first_date).num_days();
                if gap <= self.max_gap_days {
                    anomalies.push(Anomaly {
                        rule: RULE_NAME.to_string(),
                        severity: Severity::Warning,
                        entity: Some(symbol.to_string()),
                        date: ctx.anomaly_date(Some(second_date)),
                        message: format!(
                            "{symbol}: two stock splits within {gap} days ({first_date} and {second_date})",
                        ),
                        observed: Some(gap as f64),
                        expected: Some(self.max_gap_days as f64),
                    });
                }
            }
        }

        Ok(anomalies)
    }
}
