//! Extreme period-over-period change detection for financial statements.
//!
//! A symbol is flagged when a metric shows more than one change that both
//! exceeds the absolute threshold and dwarfs the symbol's own average
//! absolute change; a single extreme period is treated as a one-off event.

use chrono::NaiveDate;
use idxwatch_core::{Anomaly, DataSlice, FinancialRow, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

/// Year-over-year changes on annual statements.
pub struct ExtremeAnnualChangeRule {
    pub threshold_pct: f64,
    pub average_factor: f64,
}

impl Default for ExtremeAnnualChangeRule {
    fn default() -> Self {
        Self {
            threshold_pct: 75.0,
            average_factor: 2.0,
        }
    }
}

/// Quarter-over-quarter changes on quarterly statements. Quarterly data is
/// more volatile, so both thresholds sit higher.
pub struct ExtremeQuarterlyChangeRule {
    pub threshold_pct: f64,
    pub average_factor: f64,
}

impl Default for ExtremeQuarterlyChangeRule {
    fn default() -> Self {
        Self {
            threshold_pct: 100.0,
            average_factor: 2.5,
        }
    }
}

fn metric_value(row: &FinancialRow, metric: &str) -> Option<f64> {
    match metric {
        "revenue" => row.revenue,
        "total_revenue" => row.total_revenue,
        "earnings" => row.earnings,
        "total_assets" => row.total_assets,
        _ => None,
    }
}

fn symbols_in_order(rows: &[FinancialRow]) -> Vec<&str> {
    let mut symbols: Vec<&str> = Vec::new();
    for row in rows {
        if !row.symbol.is_empty() && !symbols.contains(&row.symbol.as_str()) {
            symbols.push(row.symbol.as_str());
        }
    }
    symbols
}

fn scan(
    rule_name: &str,
    rows: &[FinancialRow],
    metrics: &[&str],
    min_periods: usize,
    threshold_pct: f64,
    average_factor: f64,
    period: &str,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for symbol in symbols_in_order(rows) {
        let mut series: Vec<&FinancialRow> = rows
            .iter()
            .filter(|r| r.symbol == symbol && r.date.is_some())
            .collect();
        series.sort_by_key(|r| r.date);

        if series.len() < min_periods {
            continue;
        }

        for &metric in metrics {
            // Percentage change against the previous period; rows with a
            // missing value break the chain rather than being coerced to 0.
            let mut changes: Vec<(NaiveDate, f64)> = Vec::new();
            let mut prev: Option<f64> = None;
            for row in &series {
                let current = metric_value(row, metric);
                if let (Some(p), Some(c)) = (prev, current) {
                    if p != 0.0 {
                        changes.push((row.date.unwrap_or_default(), (c - p) / p * 100.0));
                    }
                }
                prev = current;
            }

            if changes.is_empty() {
                continue;
            }

            let avg_abs =
                changes.iter().map(|(_, c)| c.abs()).sum::<f64>() / changes.len() as f64;
            let extremes: Vec<&(NaiveDate, f64)> = changes
                .iter()
                .filter(|(_, c)| c.abs() > threshold_pct && c.abs() > avg_abs * average_factor)
                .collect();

            if extremes.len() > 1 {
                let periods: Vec<String> =
                    extremes.iter().map(|(d, _)| d.to_string()).collect();
                let max_change = extremes
                    .iter()
                    .map(|(_, c)| c.abs())
                    .fold(0.0_f64, f64::max);
                anomalies.push(Anomaly {
                    rule: rule_name.to_string(),
                    severity: Severity::Warning,
                    entity: Some(symbol.to_string()),
                    date: None,
                    message: format!(
                        "{symbol}: {metric} shows {} extreme {period} changes (>{threshold_pct}%) \
                         in {} (average absolute change {avg_abs:.1}%)",
                        extremes.len(),
                        periods.join(", "),
                    ),
                    observed: Some(max_change),
                    expected: Some(threshold_pct),
                });
            }
        }
    }

    anomalies
}

impl Rule for ExtremeAnnualChangeRule {
    fn name(&self) -> &'static str {
        "extreme_annual_change"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::AnnualFinancials
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        _ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::AnnualFinancials(rows) = slice else {
            return Ok(Vec::new());
        };
        Ok(scan(
            self.name(),
            rows,
            &["revenue", "earnings", "total_assets"],
            2,
            self.threshold_pct,
            self.average_factor,
            "annual",
        ))
    }
}

impl Rule for ExtremeQuarterlyChangeRule {
    fn name(&self) -> &'static str {
        "extreme_quarterly_change"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        kind == TableKind::QuarterlyFinancials
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        _ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let DataSlice::QuarterlyFinancials(rows) = slice else {
            return Ok(Vec::new());
        };
        Ok(scan(
            self.name(),
            rows,
            &["total_revenue", "earnings", "total_assets"],
            4,
            self.threshold_pct,
            self.average_factor,
            "quarterly",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ctx_for, fin_row};

    fn annual(symbol: &str, year: i32, revenue: f64) -> FinancialRow {
        let mut row = fin_row(symbol, &format!("{year}-12-31"));
        row.revenue = Some(revenue);
        row
    }

    #[test]
    fn repeated_extreme_swings_are_flagged() {
        // Years of ±2% noise, then two +500%-class swings: both clear the
        // absolute threshold and dwarf the symbol's average change.
        let values = [
            (2014, 100.0),
            (2015, 102.0),
            (2016, 100.0),
            (2017, 102.0),
            (2018, 100.0),
            (2019, 102.0),
            (2020, 100.0),
            (2021, 600.0),
            (2022, 100.0),
            (2023, 650.0),
        ];
        let rows = values
            .iter()
            .map(|&(y, v)| annual("ASII.JK", y, v))
            .collect();
        let slice = DataSlice::AnnualFinancials(rows);
        let found = ExtremeAnnualChangeRule::default()
            .evaluate(&slice, &ctx_for("2014-01-01", "2023-12-31"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity.as_deref(), Some("ASII.JK"));
        assert!(found[0].message.contains("revenue"));
    }

    #[test]
    fn single_extreme_year_is_a_one_off() {
        let rows = vec![
            annual("ASII.JK", 2020, 100.0),
            annual("ASII.JK", 2021, 104.0),
            annual("ASII.JK", 2022, 300.0),
            annual("ASII.JK", 2023, 310.0),
        ];
        let slice = DataSlice::AnnualFinancials(rows);
        let found = ExtremeAnnualChangeRule::default()
            .evaluate(&slice, &ctx_for("2020-01-01", "2023-12-31"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn steady_growth_passes() {
        let rows = (2018..=2023)
            .map(|y| annual("BBCA.JK", y, 100.0 * 1.1_f64.powi(y - 2018)))
            .collect();
        let slice = DataSlice::AnnualFinancials(rows);
        let found = ExtremeAnnualChangeRule::default()
            .evaluate(&slice, &ctx_for("2018-01-01", "2023-12-31"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn missing_values_break_the_chain() {
        let mut gap = fin_row("ASII.JK", "2021-12-31");
        gap.revenue = None;
        let rows = vec![
            annual("ASII.JK", 2020, 100.0),
            gap,
            annual("ASII.JK", 2022, 900.0),
            annual("ASII.JK", 2023, 100.0),
        ];
        let slice = DataSlice::AnnualFinancials(rows);
        // 2020→2022 is not computed across the gap; only 2022→2023 (−89%)
        // remains, a single extreme.
        let found = ExtremeAnnualChangeRule::default()
            .evaluate(&slice, &ctx_for("2020-01-01", "2023-12-31"))
            .unwrap();
        assert!(found.is_empty());
    }
}
