//! Statistical outlier detection over each dataset's primary numeric field.
//!
//! Daily prices use a per-symbol trailing window (rolling mean/σ of the
//! close); low-frequency tables use the spread of the whole slice. The
//! deviation multiplier and window length come from configuration.

use chrono::NaiveDate;
use idxwatch_core::{Anomaly, DataSlice, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "statistical_outlier";
/// Minimum observations before a spread estimate is trusted.
const MIN_OBSERVATIONS: usize = 5;

/// Flags values deviating more than `sigma` standard deviations from the
/// trailing (or slice-wide) mean of the dataset's primary metric.
pub struct OutlierRule;

fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < MIN_OBSERVATIONS {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (std > f64::EPSILON).then_some((mean, std))
}

fn outlier(
    ctx: &RuleContext,
    entity: &str,
    date: Option<NaiveDate>,
    field: &str,
    value: f64,
    mean: f64,
    std: f64,
) -> Option<Anomaly> {
    let deviation = (value - mean).abs() / std;
    (deviation > ctx.outlier_sigma).then(|| Anomaly {
        rule: RULE_NAME.to_string(),
        severity: Severity::Warning,
        entity: Some(entity.to_string()),
        date: ctx.anomaly_date(date),
        message: format!(
            "{entity}: {field} {value} deviates {deviation:.1}σ from trailing mean {mean:.2}"
        ),
        observed: Some(value),
        expected: Some(mean),
    })
}

/// Per-symbol rolling scan: each point is judged against the window of
/// points strictly before it.
fn rolling_scan(
    ctx: &RuleContext,
    series: &[(String, Option<NaiveDate>, f64)],
    field: &str,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let mut symbols: Vec<&str> = Vec::new();
    for (symbol, _, _) in series {
        if !symbols.contains(&symbol.as_str()) {
            symbols.push(symbol.as_str());
        }
    }

    for symbol in symbols {
        let mut points: Vec<(Option<NaiveDate>, f64)> = series
            .iter()
            .filter(|(s, _, _)| s == symbol)
            .map(|(_, d, v)| (*d, *v))
            .collect();
        points.sort_by_key(|(d, _)| *d);

        for i in 0..points.len() {
            let start = i.saturating_sub(ctx.outlier_window);
            let window: Vec<f64> = points[start..i].iter().map(|(_, v)| *v).collect();
            if let Some((mean, std)) = mean_std(&window) {
                let (date, value) = points[i];
                if let Some(found) = outlier(ctx, symbol, date, field, value, mean, std) {
                    anomalies.push(found);
                }
            }
        }
    }

    anomalies
}

/// Slice-wide scan for low-frequency tables: each value judged against the
/// spread of all the others.
fn slice_scan(
    ctx: &RuleContext,
    series: &[(String, Option<NaiveDate>, f64)],
    field: &str,
) -> Vec<Anomaly> {
    let values: Vec<f64> = series.iter().map(|(_, _, v)| *v).collect();
    let Some((mean, std)) = mean_std(&values) else {
        return Vec::new();
    };

    series
        .iter()
        .filter_map(|(entity, date, value)| outlier(ctx, entity, *date, field, *value, mean, std))
        .collect()
}

impl Rule for OutlierRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        // Stock splits carry no meaningful numeric distribution.
        kind != TableKind::StockSplits
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let anomalies = match slice {
            DataSlice::DailyPrices(rows) => {
                let series: Vec<_> = rows
                    .iter()
                    .filter_map(|r| r.close.map(|v| (r.symbol.clone(), r.date, v)))
                    .collect();
                rolling_scan(ctx, &series, "close")
            }
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => {
                let series: Vec<_> = rows
                    .iter()
                    .filter_map(|r| r.earnings.map(|v| (r.symbol.clone(), r.date, v)))
                    .collect();
                slice_scan(ctx, &series, "earnings")
            }
            DataSlice::Dividends(rows) => {
                let series: Vec<_> = rows
                    .iter()
                    .filter_map(|r| r.yield_value.map(|v| (r.symbol.clone(), r.date, v)))
                    .collect();
                slice_scan(ctx, &series, "yield")
            }
            DataSlice::Filings(rows) => {
                let series: Vec<_> = rows
                    .iter()
                    .filter_map(|r| {
                        r.price.map(|v| {
                            (
                                r.tickers.first().cloned().unwrap_or_default(),
                                r.date(),
                                v,
                            )
                        })
                    })
                    .collect();
                slice_scan(ctx, &series, "filing price")
            }
            DataSlice::StockSplits(_) => Vec::new(),
        };

        Ok(anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ctx_for, daily_row};

    #[test]
    fn price_spike_beyond_sigma_is_flagged() {
        let mut rows = Vec::new();
        // Stable series, then a spike.
        for day in 1..=20 {
            rows.push(daily_row(
                "BBCA.JK",
                &format!("2024-01-{day:02}"),
                9000.0 + (day % 3) as f64 * 10.0,
            ));
        }
        rows.push(daily_row("BBCA.JK", "2024-01-21", 15000.0));

        let slice = DataSlice::DailyPrices(rows);
        let found = OutlierRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, Some("2024-01-21".parse().unwrap()));
        assert_eq!(found[0].observed, Some(15000.0));
    }

    #[test]
    fn stable_series_passes() {
        let rows: Vec<_> = (1..=25)
            .map(|day| daily_row("BBCA.JK", &format!("2024-01-{day:02}"), 9000.0 + day as f64))
            .collect();
        let slice = DataSlice::DailyPrices(rows);
        let found = OutlierRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn short_series_is_not_judged() {
        let rows: Vec<_> = (1..=3)
            .map(|day| daily_row("BBCA.JK", &format!("2024-01-{day:02}"), 9000.0))
            .collect();
        let slice = DataSlice::DailyPrices(rows);
        let found = OutlierRule
            .evaluate(&slice, &ctx_for("2024-01-01", "2024-01-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
