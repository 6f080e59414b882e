//! Run orchestration: persistence with cache fallback, registry updates,
//! bounded all-tables fan-out, and the per-run notification decision.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use idxwatch_core::{
    DateRange, RunSummary, TableKind, TableOutcome, TableRegistry, ValidationConfig,
    ValidationResult,
};
use idxwatch_notify::{AnomalySummary, Notifier};
use idxwatch_store::{ResultCache, ResultStore};

use crate::validator::Validator;

/// Drives validation runs end to end. Cheap to clone (every collaborator
/// sits behind an `Arc`) so `run_all` can hand copies to its tasks.
#[derive(Clone)]
pub struct Orchestrator {
    validator: Arc<Validator>,
    registry: Arc<TableRegistry>,
    store: Arc<dyn ResultStore>,
    cache: Arc<ResultCache>,
    notifier: Arc<dyn Notifier>,
    cfg: ValidationConfig,
}

impl Orchestrator {
    pub fn new(
        validator: Arc<Validator>,
        registry: Arc<TableRegistry>,
        store: Arc<dyn ResultStore>,
        cache: Arc<ResultCache>,
        notifier: Arc<dyn Notifier>,
        cfg: ValidationConfig,
    ) -> Self {
        Self {
            validator,
            registry,
            store,
            cache,
            notifier,
            cfg,
        }
    }

    /// Validate one table, persist the result, and decide notification.
    pub async fn run_one(&self, table: TableKind, range: DateRange) -> ValidationResult {
        let result = self.run_table(table, range).await;
        self.maybe_notify(AnomalySummary::from_result(&result)).await;
        result
    }

    /// Validate every registered table with bounded concurrency.
    ///
    /// Tables are isolated: one table's failure never aborts the others. A
    /// task that dies is recorded as a failed entry, keeping the
    /// one-entry-per-table invariant. Exactly one notification decision is
    /// made for the whole run. Tasks are detached, so a caller abandoning
    /// this future lets in-flight validations finish and persist.
    pub async fn run_all(&self, range: DateRange) -> RunSummary {
        let started_at = Utc::now();
        let kinds = self.registry.kinds();
        let semaphore = Arc::new(Semaphore::new(self.cfg.run_all_concurrency));

        let mut handles = Vec::with_capacity(kinds.len());
        for kind in kinds.iter().copied() {
            let orchestrator = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("run_all semaphore closed");
                orchestrator.run_table(kind, range).await
            });
            handles.push((kind, handle));
        }

        // Key the summary in registry order; every requested table appears
        // exactly once, as a result or a recorded failure.
        let mut tables = IndexMap::new();
        for (kind, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => TableOutcome::Completed(result),
                Err(e) => {
                    warn!(table = %kind, error = %e, "validation task died");
                    TableOutcome::Failed {
                        error: e.to_string(),
                        executed_at: Utc::now(),
                    }
                }
            };
            tables.insert(kind, outcome);
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            tables,
        };

        let counts = summary.severity_counts();
        info!(
            tables = summary.tables.len(),
            anomalies = counts.total(),
            critical = counts.critical,
            "all-tables run complete"
        );

        self.maybe_notify(AnomalySummary::from_run(&summary)).await;
        summary
    }

    /// Validate + persist one table. Shared by `run_one` and `run_all` so
    /// the notification decision stays once-per-run.
    async fn run_table(&self, table: TableKind, range: DateRange) -> ValidationResult {
        let mut result = self.validator.validate(table, range).await;

        // Staleness is observable for failed runs too.
        self.registry.mark_validated(table, result.executed_at);

        if let Err(e) = self.store.write(&result).await {
            // The result still reaches the caller and the local cache; only
            // the persistence tier is degraded.
            warn!(table = %table, error = %e, "store write failed, result kept in local cache only");
            result.degraded_persistence = true;
        }
        self.cache.insert(result.clone());

        result
    }

    /// At most one dispatch per run, only when a finding reaches the
    /// configured threshold. Delivery failures and timeouts are logged,
    /// never escalated.
    async fn maybe_notify(&self, summary: AnomalySummary) {
        let triggering = summary.totals.at_or_above(self.cfg.notify_threshold);
        if triggering == 0 {
            debug!(scope = %summary.scope, "no findings at notification threshold");
            return;
        }

        let deadline = Duration::from_secs(self.cfg.notify_timeout_secs);
        match timeout(deadline, self.notifier.send(&summary)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(
                    channel = self.notifier.channel_name(),
                    error = %e,
                    "notification delivery failed"
                );
            }
            Err(_) => {
                warn!(
                    channel = self.notifier.channel_name(),
                    timeout_secs = deadline.as_secs(),
                    "notification dispatch timed out"
                );
            }
        }
    }
}
