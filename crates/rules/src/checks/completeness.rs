//! Null checks on non-nullable domain fields.

use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "completeness";

/// Flags rows missing a value in a field the dataset cannot do without
/// (close price, ex-date, split ratio, ...).
pub struct CompletenessRule;

fn missing(entity: Option<&str>, row: usize, field: &str) -> Anomaly {
    let who = entity
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("row {row}"));
    Anomaly {
        rule: RULE_NAME.to_string(),
        severity: Severity::Critical,
        entity: entity.filter(|s| !s.is_empty()).map(|s| s.to_string()),
        date: None,
        message: format!("{who}: missing required field '{field}'"),
        observed: None,
        expected: None,
    }
}

impl Rule for CompletenessRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn applies_to(&self, _kind: TableKind) -> bool {
        true
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        _ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let mut anomalies = Vec::new();

        match slice {
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if row.symbol.is_empty() {
                        anomalies.push(missing(None, i, "symbol"));
                    }
                    if row.date.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "date"));
                    }
                }
            }
            DataSlice::DailyPrices(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if row.symbol.is_empty() {
                        anomalies.push(missing(None, i, "symbol"));
                    }
                    if row.date.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "date"));
                    }
                    if row.close.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "close"));
                    }
                }
            }
            DataSlice::Dividends(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if row.symbol.is_empty() {
                        anomalies.push(missing(None, i, "symbol"));
                    }
                    if row.date.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "date"));
                    }
                    if row.yield_value.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "yield"));
                    }
                }
            }
            DataSlice::Filings(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if row.timestamp.is_none() {
                        anomalies.push(missing(None, i, "timestamp"));
                    }
                    if row.tickers.is_empty() {
                        anomalies.push(missing(None, i, "tickers"));
                    }
                }
            }
            DataSlice::StockSplits(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if row.symbol.is_empty() {
                        anomalies.push(missing(None, i, "symbol"));
                    }
                    if row.date.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "date"));
                    }
                    if row.split_ratio.is_none() {
                        anomalies.push(missing(Some(&row.symbol), i, "split_ratio"));
                    }
                }
            }
        }

        Ok(anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ctx_for, daily_row};
    use idxwatch_core::DailyPriceRow;

    #[test]
    fn null_close_is_critical() {
        let mut row = daily_row("BBCA.JK", "2024-01-15", 9000.0);
        row.close = None;
        let slice = DataSlice::DailyPrices(vec![row, daily_row("BBCA.JK", "2024-01-16", 9100.0)]);

        let found = CompletenessRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Critical);
        assert!(found[0].message.contains("close"));
        assert_eq!(found[0].entity.as_deref(), Some("BBCA.JK"));
    }

    #[test]
    fn complete_rows_produce_nothing() {
        let slice = DataSlice::DailyPrices(vec![daily_row("TLKM.JK", "2024-01-15", 3200.0)]);
        let found = CompletenessRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn anonymous_row_is_identified_by_index() {
        let slice = DataSlice::DailyPrices(vec![DailyPriceRow::default()]);
        let found = CompletenessRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        // symbol, date, and close all missing
        assert_eq!(found.len(), 3);
        assert!(found[0].message.starts_with("row 0"));
        assert!(found[0].entity.is_none());
    }
}
