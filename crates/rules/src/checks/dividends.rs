//! Dividend yield plausibility: suspicious yearly totals and jumps.

use std::collections::BTreeMap;

use chrono::Datelike;
use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "dividend_yield";

/// Flags symbols whose summed yearly yield reaches `high_yield` (a 30%+
/// dividend yield is almost always a data problem) or whose yearly yield
/// jumps by `change_threshold` percentage points against the prior year.
pub struct DividendYieldRule {
    pub high_yield: f64,
    pub change_threshold: f64,
}

impl Default for DividendYieldRule {
    fn default() -> Self {
        Self {
            high_yield: 0.30,
            change_threshold: 0.10,
        }
    }
}

impl Rule for DividendYieldRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::Dividends
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        _ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::Dividends(rows) = slice else {
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
            // Yearly yield totals, year-ascending.
            let mut yearly: BTreeMap<i32, f64> = BTreeMap::new();
            for row in rows.iter().filter(|r| r.symbol == symbol) {
                if let (Some(date), Some(yield_value)) = (row.date, row.yield_value) {
                    *yearly.entry(date.year()).or_insert(0.0) += yield_value;
                }
            }

            for (&year, &total) in &yearly {
                if total >= self.high_yield {
                    anomalies.push(Anomaly {
                        rule: RULE_NAME.to_string(),
                        severity: Severity::Warning,
                        entity: Some(symbol.to_string()),
                        date: None,
                        message: format!(
                            "{symbol} in {year}: yearly yield {:.1}% reaches the {:.0}% ceiling",
                            total * 100.0,
                            self.high_yield * 100.0,
                        ),
                        observed: Some(total),
                        expected: Some(self.high_yield),
                    });
                }
            }

            let totals: Vec<(i32, f64)> = yearly.into_iter().collect();
            for pair in totals.windows(2) {
                let ((_, prev), (year, current)) = (pair[0], pair[1]);
                let change = (current - prev).abs();
                if change >= self.change_threshold {
                    anomalies.push(Anomaly {
                        rule: RULE_NAME.to_string(),
                        severity: Severity::Warning,
                        entity: Some(symbol.to_string()),
                        date: None,
                        message: format!(
                            "{symbol} in {year}: yearly yield changed by {:.1} percentage points",
                            change * 100.0,
                        ),
                        observed: Some(change),
                        expected: Some(self.change_threshold),
                    });
                }
            }
        }

        Ok(anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ctx_for, dividend_row};

    #[test]
    fn thirty_percent_yearly_yield_is_flagged() {
        let slice = DataSlice::Dividends(vec![
            dividend_row("PTBA.JK", "2023-04-01", 0.18),
            dividend_row("PTBA.JK", "2023-10-01", 0.15),
        ]);
        let found = DividendYieldRule::default()
            .evaluate(&slice, &ctx_for("2023-01-01", "2023-12-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        let total = found[0].observed.unwrap();
        assert!((total - 0.33).abs() < 1e-9);
    }

    #[test]
    fn yield_jump_between_years_is_flagged() {
        let slice = DataSlice::Dividends(vec![
            dividend_row("ADRO.JK", "2022-05-01", 0.04),
            dividend_row("ADRO.JK", "2023-05-01", 0.19),
        ]);
        let found = DividendYieldRule::default()
            .evaluate(&slice, &ctx_for("2022-01-01", "2023-12-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("percentage points"));
    }

    #[test]
    fn ordinary_yields_pass() {
        let slice = DataSlice::Dividends(vec![
            dividend_row("BBCA.JK", "2022-05-01", 0.025),
            dividend_row("BBCA.JK", "2023-05-01", 0.028),
        ]);
        let found = DividendYieldRule::default()
            .evaluate(&slice, &ctx_for("2022-01-01", "2023-12-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
