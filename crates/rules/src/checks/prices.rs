//! Day-over-day close-price movement monitoring.

use idxwatch_core::{Anomaly, DailyPriceRow, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "extreme_daily_move";

/// Flags close prices that moved more than `threshold_pct` against the
/// previous trading day for the same symbol.
pub struct DailyMoveRule {
    pub threshold_pct: f64,
}

impl Default for DailyMoveRule {
    fn default() -> Self {
        Self { threshold_pct: 35.0 }
    }
}

impl Rule for DailyMoveRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::DailyPrices
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::DailyPrices(rows) = slice else {
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
            let mut series: Vec<&DailyPriceRow> = rows
                .iter()
                .filter(|r| r.symbol == symbol && r.date.is_some() && r.close.is_some())
                .collect();
            series.sort_by_key(|r| r.date);

            for pair in series.windows(2) {
                let (prev, current) = (pair[0], pair[1]);
                let (Some(prev_close), Some(close)) = (prev.close, current.close) else {
                    continue;
                };
                if prev_close == 0.0 {
                    continue;
                }
                let change_pct = (close - prev_close) / prev_close * 100.0;
                if change_pct.abs() > self.threshold_pct {
                    anomalies.push(Anomaly {
                        rule: RULE_NAME.to_string(),
                        severity: Severity::Warning,
                        entity: Some(symbol.to_string()),
                        date: ctx.anomaly_date(current.date),
                        message: format!(
                            "{symbol} on {}: close moved {change_pct:.1}% (close {close}, previous {prev_close})",
                            current.date.map(|d| d.to_string()).unwrap_or_default(),
                        ),
                        observed: Some(change_pct),
                        expected: Some(self.threshold_pct),
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
    use crate::testkit::{ctx_for, daily_row};

    #[test]
    fn forty_percent_move_is_flagged() {
        let slice = DataSlice::DailyPrices(vec![
            daily_row("GOTO.JK", "2024-01-10", 100.0),
            daily_row("GOTO.JK", "2024-01-11", 140.0),
        ]);
        let found = DailyMoveRule::default()
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].observed, Some(40.0));
        assert_eq!(found[0].date, Some("2024-01-11".parse().unwrap()));
    }

    #[test]
    fn moves_within_threshold_pass() {
        let slice = DataSlice::DailyPrices(vec![
            daily_row("BBCA.JK", "2024-01-10", 9000.0),
            daily_row("BBCA.JK", "2024-01-11", 9300.0),
        ]);
        let found = DailyMoveRule::default()
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn symbols_do_not_cross_contaminate() {
        // A cheap and an expensive symbol interleaved: comparing across
        // symbols would register huge phantom moves.
        let slice = DataSlice::DailyPrices(vec![
            daily_row("GOTO.JK", "2024-01-10", 80.0),
            daily_row("BBCA.JK", "2024-01-10", 9000.0),
            daily_row("GOTO.JK", "2024-01-11", 82.0),
            daily_row("BBCA.JK", "2024-01-11", 9100.0),
        ]);
        let found = DailyMoveRule::default()
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
