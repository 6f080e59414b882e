//! Filing price cross-check against the daily close.
//!
//! The reference close lookup is assembled by the validator from the daily
//! prices table for the same window; filings without a matching reference
//! close are skipped (there is nothing to compare against).

use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "filing_price_discrepancy";

/// Flags filings whose declared price differs from that day's close by at
/// least `threshold_pct` percent.
pub struct FilingPriceRule {
    pub threshold_pct: f64,
}

impl Default for FilingPriceRule {
    fn default() -> Self {
        Self { threshold_pct: 50.0 }
    }
}

impl Rule for FilingPriceRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::Filings
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::Filings(rows) = slice else {
            return Ok(Vec::new());
        };

        let mut anomalies = Vec::new();
        for filing in rows {
            let (Some(price), Some(date)) = (filing.price, filing.date()) else {
                continue;
            };

            for ticker in &filing.tickers {
                let Some(&close) = ctx.daily_close.get(&(ticker.clone(), date)) else {
                    continue;
                };
                if close == 0.0 {
                    continue;
                }
                let diff_pct = (price - close).abs() / close * 100.0;
                if diff_pct >= self.threshold_pct {
                    anomalies.push(Anomaly {
                        rule: RULE_NAME.to_string(),
                        severity: Severity::Warning,
                        entity: Some(ticker.clone()),
                        date: ctx.anomaly_date(Some(date)),
                        message: format!(
                            "{ticker} on {date}: filing price {price} differs from daily close \
                             {close} by {diff_pct:.1}%",
                        ),
                        observed: Some(diff_pct),
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
    use crate::testkit::{ctx_for, filing_row};

    fn ctx_with_close(close: f64) -> RuleContext {
        let mut ctx = ctx_for("2024-01-01", "2024-01-31");
        ctx.daily_close
            .insert(("GOTO.JK".to_string(), "2024-01-10".parse().unwrap()), close);
        ctx
    }

    #[test]
    fn large_discrepancy_is_flagged() {
        let slice = DataSlice::Filings(vec![filing_row("GOTO.JK", "2024-01-10T09:30:00Z", 200.0)]);
        let found = FilingPriceRule::default()
            .evaluate(&slice, &ctx_with_close(100.0))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].observed, Some(100.0));
        assert_eq!(found[0].entity.as_deref(), Some("GOTO.JK"));
    }

    #[test]
    fn close_agreement_passes() {
        let slice = DataSlice::Filings(vec![filing_row("GOTO.JK", "2024-01-10T09:30:00Z", 104.0)]);
        let found = FilingPriceRule::default()
            .evaluate(&slice, &ctx_with_close(100.0))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn missing_reference_close_abstains() {
        let slice = DataSlice::Filings(vec![filing_row("GOTO.JK", "2024-01-10T09:30:00Z", 200.0)]);
        let found = FilingPriceRule::default()
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
