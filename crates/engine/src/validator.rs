//! Single-table validation: fetch a slice, run the rule set, produce a
//! result. Persistence and notification belong to the orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use idxwatch_core::{
    Anomaly, DataSlice, DataSource, DateRange, FetchError, Severity, TableKind, ValidationConfig,
    ValidationResult, ValidationStatus,
};
use idxwatch_rules::{RuleCatalog, RuleContext};

pub struct Validator {
    source: Arc<dyn DataSource>,
    catalog: Arc<RuleCatalog>,
    cfg: ValidationConfig,
    fetch_timeout: Duration,
}

impl Validator {
    pub fn new(
        source: Arc<dyn DataSource>,
        catalog: Arc<RuleCatalog>,
        cfg: ValidationConfig,
        fetch_timeout_secs: u64,
    ) -> Self {
        Self {
            source,
            catalog,
            cfg,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        }
    }

    /// Default window when none was requested: daily prices look back 7
    /// days, quarterly financials one year, everything else is unbounded
    /// (configurable; see `ValidationConfig`).
    fn effective_range(&self, table: TableKind, range: DateRange, today: NaiveDate) -> DateRange {
        if !range.is_unbounded() {
            return range;
        }
        match table {
            TableKind::DailyPrices => {
                DateRange::trailing_days(today, self.cfg.daily_lookback_days)
            }
            TableKind::QuarterlyFinancials => {
                DateRange::trailing_days(today, self.cfg.quarterly_lookback_days)
            }
            _ => range,
        }
    }

    /// Validate one table over the given window.
    ///
    /// - fetch error or timeout → `Failed` result, no rules run
    /// - a rule erroring internally → synthetic critical anomaly naming the
    ///   rule, status `Partial`, remaining rules still run
    /// - otherwise `Success`, whatever the anomaly count
    pub async fn validate(&self, table: TableKind, range: DateRange) -> ValidationResult {
        let started = std::time::Instant::now();
        let today = Utc::now().date_naive();
        let range = self.effective_range(table, range, today);

        let slice = match self.fetch_with_deadline(table, range).await {
            Ok(slice) => slice,
            Err(e) => {
                warn!(table = %table, error = %e, "data fetch failed");
                return ValidationResult::failed(
                    table,
                    range,
                    e.to_string(),
                    started.elapsed().as_millis() as u64,
                );
            }
        };

        let mut ctx = RuleContext::new(range, today, &self.cfg);
        if table == TableKind::Filings {
            ctx = ctx.with_daily_close(self.reference_closes(range).await);
        }

        let mut anomalies: Vec<Anomaly> = Vec::new();
        let mut degraded = false;
        for rule in self.catalog.rules_for(table) {
            match rule.evaluate(&slice, &ctx) {
                Ok(found) => anomalies.extend(found),
                Err(e) => {
                    // Isolated per rule: record the failure and keep going.
                    warn!(table = %table, rule = rule.name(), error = %e, "rule evaluation failed");
                    degraded = true;
                    anomalies.push(Anomaly {
                        rule: rule.name().to_string(),
                        severity: Severity::Critical,
                        entity: None,
                        date: None,
                        message: format!("rule '{}' failed to evaluate: {e}", rule.name()),
                        observed: None,
                        expected: None,
                    });
                }
            }
        }

        let status = if degraded {
            ValidationStatus::Partial
        } else {
            ValidationStatus::Success
        };

        debug!(
            table = %table,
            rows = slice.row_count(),
            anomalies = anomalies.len(),
            ?status,
            "validation complete"
        );

        ValidationResult {
            run_id: Uuid::new_v4(),
            table,
            range,
            executed_at: Utc::now(),
            status,
            anomalies,
            rows_processed: slice.row_count(),
            duration_ms: started.elapsed().as_millis() as u64,
            degraded_persistence: false,
            error: None,
        }
    }

    async fn fetch_with_deadline(
        &self,
        table: TableKind,
        range: DateRange,
    ) -> Result<DataSlice, FetchError> {
        match timeout(self.fetch_timeout, self.source.fetch(table, range)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                table,
                seconds: self.fetch_timeout.as_secs(),
            }),
        }
    }

    /// Reference close prices for the filing cross-check. A failed
    /// auxiliary fetch degrades to an empty lookup; the discrepancy rule
    /// then abstains rather than failing the run.
    async fn reference_closes(&self, range: DateRange) -> HashMap<(String, NaiveDate), f64> {
        match self.fetch_with_deadline(TableKind::DailyPrices, range).await {
            Ok(DataSlice::DailyPrices(rows)) => rows
                .into_iter()
                .filter_map(|row| match (row.date, row.close) {
                    (Some(date), Some(close)) => Some(((row.symbol, date), close)),
                    _ => None,
                })
                .collect(),
            Ok(_) => HashMap::new(),
            Err(e) => {
                warn!(error = %e, "reference price fetch failed, filing cross-check disabled");
                HashMap::new()
            }
        }
    }
}
