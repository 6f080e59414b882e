//! Window and value sanity: out-of-range dates, impossible values,
//! future-dated rows.

use chrono::NaiveDate;
use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "date_range_sanity";

/// Flags rows whose date falls outside the requested window, rows dated in
/// the future, and logically impossible values (negative price, non-positive
/// split ratio).
pub struct SanityRule;

fn finding(entity: Option<&str>, message: String, observed: Option<f64>) -> Anomaly {
    Anomaly {
        rule: RULE_NAME.to_string(),
        severity: Severity::Critical,
        entity: entity.filter(|s| !s.is_empty()).map(|s| s.to_string()),
        // Out-of-window and future dates are by definition outside the
        // validated range, so the date slot stays empty and the offending
        // date lives in the message.
        date: None,
        message,
        observed,
        expected: None,
    }
}

impl SanityRule {
    fn check_date(
        &self,
        ctx: &RuleContext,
        entity: &str,
        date: Option<NaiveDate>,
        out: &mut Vec<Anomaly>,
    ) {
        let Some(date) = date else { return };
        if !ctx.range.contains(date) {
            out.push(finding(
                Some(entity),
                format!("{entity}: row dated {date} falls outside the validated window {}", ctx.range),
                None,
            ));
        } else if date > ctx.today {
            out.push(finding(
                Some(entity),
                format!("{entity}: row dated {date} is in the future"),
                None,
            ));
        }
    }

    fn check_non_negative(
        &self,
        entity: &str,
        field: &str,
        value: Option<f64>,
        out: &mut Vec<Anomaly>,
    ) {
        if let Some(v) = value {
            if v < 0.0 {
                out.push(finding(
                    Some(entity),
                    format!("{entity}: negative {field} ({v})"),
                    Some(v),
                ));
            }
        }
    }
}

impl Rule for SanityRule {
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
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let mut anomalies = Vec::new();

        match slice {
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => {
                for row in rows {
                    self.check_date(ctx, &row.symbol, row.date, &mut anomalies);
                    self.check_non_negative(
                        &row.symbol,
                        "total_assets",
                        row.total_assets,
                        &mut anomalies,
                    );
                }
            }
            DataSlice::DailyPrices(rows) => {
                for row in rows {
                    self.check_date(ctx, &row.symbol, row.date, &mut anomalies);
                    self.check_non_negative(&row.symbol, "close price", row.close, &mut anomalies);
                    self.check_non_negative(&row.symbol, "volume", row.volume, &mut anomalies);
                }
            }
            DataSlice::Dividends(rows) => {
                for row in rows {
                    self.check_date(ctx, &row.symbol, row.date, &mut anomalies);
                    self.check_non_negative(&row.symbol, "dividend", row.dividend, &mut anomalies);
                    self.check_non_negative(&row.symbol, "yield", row.yield_value, &mut anomalies);
                }
            }
            DataSlice::Filings(rows) => {
                for row in rows {
                    let entity = row.tickers.first().map(|s| s.as_str()).unwrap_or("filing");
                    self.check_date(ctx, entity, row.date(), &mut anomalies);
                    self.check_non_negative(entity, "filing price", row.price, &mut anomalies);
                }
            }
            DataSlice::StockSplits(rows) => {
                for row in rows {
                    self.check_date(ctx, &row.symbol, row.date, &mut anomalies);
                    if let Some(ratio) = row.split_ratio {
                        if ratio <= 0.0 {
                            anomalies.push(finding(
                                Some(&row.symbol),
                                format!("{}: non-positive split ratio ({ratio})", row.symbol),
                                Some(ratio),
                            ));
                        }
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

    #[test]
    fn out_of_window_date_is_flagged_without_date_field() {
        let slice = DataSlice::DailyPrices(vec![daily_row("BBCA.JK", "2024-03-05", 9000.0)]);
        let found = SanityRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].date.is_none());
        assert!(found[0].message.contains("2024-03-05"));
    }

    #[test]
    fn negative_close_is_critical() {
        let slice = DataSlice::DailyPrices(vec![daily_row("BBCA.JK", "2024-01-10", -50.0)]);
        let found = SanityRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Critical);
        assert_eq!(found[0].observed, Some(-50.0));
    }

    #[test]
    fn future_dated_row_inside_window_is_flagged() {
        // Window extends past today; a row dated tomorrow is still wrong.
        let mut ctx = ctx_for("2024-01-01", "2024-12-31");
        ctx.today = "2024-06-15".parse().unwrap();
        let slice = DataSlice::DailyPrices(vec![daily_row("BBCA.JK", "2024-06-16", 9000.0)]);
        let found = SanityRule.evaluate(&slice, &ctx).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("future"));
    }

    #[test]
    fn clean_rows_pass() {
        let slice = DataSlice::DailyPrices(vec![daily_row("BBCA.JK", "2024-01-10", 9000.0)]);
        let found = SanityRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
