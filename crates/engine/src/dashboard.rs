//! Dashboard read path: recent results, aggregate stats, and dense trend
//! series, all served through the remote→cache fallback.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use idxwatch_core::{
    SeverityCounts, TableKind, TableRegistry, ValidationResult, ValidationStatus,
};
use idxwatch_store::{FallbackReader, ReadSource};

/// How many results back the stat aggregates look.
const STATS_WINDOW: usize = 200;

/// Recent results plus the degradation flag for the serving layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecentResults {
    pub results: Vec<ValidationResult>,
    pub served_from_cache: bool,
}

/// Aggregate counters over the observed window.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_runs: usize,
    pub anomalies: SeverityCounts,
    /// Latest status per registered table (`None` = never validated in the
    /// observed window).
    pub table_status: IndexMap<TableKind, Option<ValidationStatus>>,
    /// Fraction of observed runs that ended failed or partial.
    pub degraded_run_fraction: f64,
    pub served_from_cache: bool,
}

/// Which value a trend series reduces per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    Runs,
    Anomalies,
    CriticalAnomalies,
}

impl std::str::FromStr for TrendMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "runs" => Ok(TrendMetric::Runs),
            "anomalies" => Ok(TrendMetric::Anomalies),
            "critical_anomalies" => Ok(TrendMetric::CriticalAnomalies),
            other => Err(format!("unknown trend metric: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One dense daily series: every day in the window appears, empty days as
/// zero, never omitted.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
    pub served_from_cache: bool,
}

/// Read-side aggregation over persisted results.
pub struct DashboardAggregator {
    reader: FallbackReader,
    registry: Arc<TableRegistry>,
}

impl DashboardAggregator {
    pub fn new(reader: FallbackReader, registry: Arc<TableRegistry>) -> Self {
        Self { reader, registry }
    }

    /// The newest `limit` results. Store outages fall back to the local
    /// cache transparently; the flag records where the data came from.
    pub async fn recent_results(&self, limit: usize) -> RecentResults {
        let (results, source) = self.reader.read_recent(limit).await;
        RecentResults {
            results,
            served_from_cache: source.is_cache(),
        }
    }

    pub async fn stats(&self) -> DashboardStats {
        let (results, source) = self.reader.read_recent(STATS_WINDOW).await;
        Self::aggregate(&results, &self.registry, source)
    }

    /// Daily buckets over the last `window_days` days ending today.
    pub async fn trend_series(&self, metric: TrendMetric, window_days: u32) -> TrendSeries {
        let (results, source) = self.reader.read_recent(STATS_WINDOW).await;
        let points = bucketize(&results, metric, Utc::now().date_naive(), window_days);
        TrendSeries {
            metric,
            points,
            served_from_cache: source.is_cache(),
        }
    }

    fn aggregate(
        results: &[ValidationResult],
        registry: &TableRegistry,
        source: ReadSource,
    ) -> DashboardStats {
        let mut anomalies = SeverityCounts::default();
        let mut degraded_runs = 0usize;
        for result in results {
            anomalies.merge(result.severity_counts());
            if result.status != ValidationStatus::Success {
                degraded_runs += 1;
            }
        }

        // Results arrive newest first, so the first hit per table wins.
        let mut table_status: IndexMap<TableKind, Option<ValidationStatus>> = registry
            .kinds()
            .into_iter()
            .map(|kind| (kind, None))
            .collect();
        for result in results {
            if let Some(slot) = table_status.get_mut(&result.table) {
                if slot.is_none() {
                    *slot = Some(result.status);
                }
            }
        }

        let degraded_run_fraction = if results.is_empty() {
            0.0
        } else {
            degraded_runs as f64 / results.len() as f64
        };

        DashboardStats {
            total_runs: results.len(),
            anomalies,
            table_status,
            degraded_run_fraction,
            served_from_cache: source.is_cache(),
        }
    }
}

/// Reduce results into one value per day over `[end - window + 1, end]`.
/// Days without runs contribute an explicit zero point.
fn bucketize(
    results: &[ValidationResult],
    metric: TrendMetric,
    end: NaiveDate,
    window_days: u32,
) -> Vec<TrendPoint> {
    let days = window_days.max(1);
    let start = end - Duration::days(days as i64 - 1);

    (0..days)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            let value = results
                .iter()
                .filter(|r| r.executed_at.date_naive() == date)
                .map(|r| match metric {
                    TrendMetric::Runs => 1.0,
                    TrendMetric::Anomalies => r.anomalies.len() as f64,
                    TrendMetric::CriticalAnomalies => r.severity_counts().critical as f64,
                })
                .sum();
            TrendPoint { date, value }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use idxwatch_core::{Anomaly, DateRange, Severity};
    use idxwatch_store::{ResultCache, ResultReader, StoreError};
    use uuid::Uuid;

    use async_trait::async_trait;

    struct DownReader;

    #[async_trait]
    impl ResultReader for DownReader {
        async fn read_recent(&self, _limit: usize) -> Result<Vec<ValidationResult>, StoreError> {
            Err(StoreError::Status { code: 502 })
        }
    }

    fn result_on(day: &str, table: TableKind, severities: &[Severity]) -> ValidationResult {
        let date: NaiveDate = day.parse().unwrap();
        ValidationResult {
            run_id: Uuid::new_v4(),
            table,
            range: DateRange::unbounded(),
            executed_at: Utc
                .from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
            status: ValidationStatus::Success,
            anomalies: severities
                .iter()
                .map(|&s| Anomaly {
                    rule: "test".to_string(),
                    severity: s,
                    entity: None,
                    date: None,
                    message: "test".to_string(),
                    observed: None,
                    expected: None,
                })
                .collect(),
            rows_processed: 1,
            duration_ms: 1,
            degraded_persistence: false,
            error: None,
        }
    }

    #[tokio::test]
    async fn recent_results_fall_back_to_cache_with_flag() {
        let cache = Arc::new(ResultCache::new(10));
        cache.insert(result_on("2024-01-10", TableKind::DailyPrices, &[]));
        let aggregator = DashboardAggregator::new(
            FallbackReader::new(Arc::new(DownReader), cache),
            Arc::new(TableRegistry::standard()),
        );

        let recent = aggregator.recent_results(5).await;
        assert!(recent.served_from_cache);
        assert_eq!(recent.results.len(), 1);
    }

    #[tokio::test]
    async fn stats_cover_every_registered_table() {
        let cache = Arc::new(ResultCache::new(10));
        cache.insert(result_on(
            "2024-01-10",
            TableKind::DailyPrices,
            &[Severity::Warning, Severity::Critical],
        ));
        let aggregator = DashboardAggregator::new(
            FallbackReader::new(Arc::new(DownReader), cache),
            Arc::new(TableRegistry::standard()),
        );

        let stats = aggregator.stats().await;
        assert_eq!(stats.total_runs, 1);
        assert_eq!(stats.anomalies.warning, 1);
        assert_eq!(stats.anomalies.critical, 1);
        assert_eq!(stats.table_status.len(), TableKind::ALL.len());
        assert_eq!(
            stats.table_status[&TableKind::DailyPrices],
            Some(ValidationStatus::Success)
        );
        assert_eq!(stats.table_status[&TableKind::Dividends], None);
    }

    #[test]
    fn empty_window_yields_zero_buckets_not_omission() {
        let end: NaiveDate = "2024-01-07".parse().unwrap();
        let points = bucketize(&[], TrendMetric::Anomalies, end, 7);
        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|p| p.value == 0.0));
        assert_eq!(points[0].date, "2024-01-01".parse().unwrap());
        assert_eq!(points[6].date, end);
    }

    #[test]
    fn buckets_reduce_anomaly_counts_per_day() {
        let results = vec![
            result_on("2024-01-03", TableKind::DailyPrices, &[Severity::Warning]),
            result_on(
                "2024-01-03",
                TableKind::Dividends,
                &[Severity::Critical, Severity::Info],
            ),
            result_on("2024-01-05", TableKind::Filings, &[]),
        ];
        let end: NaiveDate = "2024-01-07".parse().unwrap();

        let anomalies = bucketize(&results, TrendMetric::Anomalies, end, 7);
        assert_eq!(anomalies[2].value, 3.0); // Jan 3
        assert_eq!(anomalies[4].value, 0.0); // Jan 5: a run with no anomalies

        let runs = bucketize(&results, TrendMetric::Runs, end, 7);
        assert_eq!(runs[2].value, 2.0);
        assert_eq!(runs[4].value, 1.0);

        let critical = bucketize(&results, TrendMetric::CriticalAnomalies, end, 7);
        assert_eq!(critical[2].value, 1.0);
    }
}
