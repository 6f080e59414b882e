//! Anomalies, per-run validation results, and all-tables run summaries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::range::DateRange;
use crate::tables::TableKind;

// ── Severity ────────────────────────────────────────────────────────

/// Anomaly severity, ordered `Info < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Critical => f.write_str("critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: '{other}'")),
        }
    }
}

/// Anomaly totals broken down by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warning += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn merge(&mut self, other: SeverityCounts) {
        self.info += other.info;
        self.warning += other.warning;
        self.critical += other.critical;
    }

    pub fn total(&self) -> usize {
        self.info + self.warning + self.critical
    }

    /// Count of anomalies at or above the given severity.
    pub fn at_or_above(&self, threshold: Severity) -> usize {
        match threshold {
            Severity::Info => self.total(),
            Severity::Warning => self.warning + self.critical,
            Severity::Critical => self.critical,
        }
    }
}

// ── Anomaly ─────────────────────────────────────────────────────────

/// One finding produced by a rule. Immutable once created.
///
/// `date` is only set when it falls inside the validated window; sanity
/// findings about out-of-window rows carry the offending value in
/// `observed`/`message` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Name of the rule that produced the finding.
    pub rule: String,
    pub severity: Severity,
    /// Affected symbol/ticker, when row-scoped.
    pub entity: Option<String>,
    pub date: Option<NaiveDate>,
    pub message: String,
    /// Detected value, when numeric.
    pub observed: Option<f64>,
    /// Expected value or threshold the observation was judged against.
    pub expected: Option<f64>,
}

// ── Validation result ───────────────────────────────────────────────

/// Outcome class of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Fetch and every rule completed. Anomaly count does not affect this.
    Success,
    /// Fetch completed but at least one rule errored internally.
    Partial,
    /// The data fetch itself failed; no rules ran.
    Failed,
}

/// The record of one validation run for one table. Append-only history:
/// one result per run, never mutated after the orchestrator finalizes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub run_id: Uuid,
    pub table: TableKind,
    pub range: DateRange,
    pub executed_at: DateTime<Utc>,
    pub status: ValidationStatus,
    pub anomalies: Vec<Anomaly>,
    pub rows_processed: usize,
    pub duration_ms: u64,
    /// Set when the store write failed and the result only reached the
    /// local cache.
    #[serde(default)]
    pub degraded_persistence: bool,
    /// Fetch error detail for `Failed` results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    /// A `Failed` result for a fetch that never produced a slice.
    pub fn failed(table: TableKind, range: DateRange, error: String, duration_ms: u64) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            table,
            range,
            executed_at: Utc::now(),
            status: ValidationStatus::Failed,
            anomalies: Vec::new(),
            rows_processed: 0,
            duration_ms,
            degraded_persistence: false,
            error: Some(error),
        }
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for anomaly in &self.anomalies {
            counts.add(anomaly.severity);
        }
        counts
    }

    /// Highest severity among the findings, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }
}

// ── Run summary ─────────────────────────────────────────────────────

/// Per-table entry in a [`RunSummary`]: either the produced result or the
/// recorded execution failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TableOutcome {
    Completed(ValidationResult),
    Failed {
        error: String,
        executed_at: DateTime<Utc>,
    },
}

impl TableOutcome {
    pub fn result(&self) -> Option<&ValidationResult> {
        match self {
            TableOutcome::Completed(result) => Some(result),
            TableOutcome::Failed { .. } => None,
        }
    }
}

/// Aggregate of one orchestrated all-tables run.
///
/// Invariant: every registered table appears exactly once, keyed by kind in
/// registry order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: IndexMap<TableKind, TableOutcome>,
}

impl RunSummary {
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for outcome in self.tables.values() {
            if let Some(result) = outcome.result() {
                counts.merge(result.severity_counts());
            }
        }
        counts
    }

    /// Highest severity across every table's findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.tables
            .values()
            .filter_map(|o| o.result())
            .filter_map(|r| r.max_severity())
            .max()
    }

    /// All anomalies across tables, severity-descending, capped at `limit`.
    pub fn top_anomalies(&self, limit: usize) -> Vec<Anomaly> {
        let mut all: Vec<Anomaly> = self
            .tables
            .values()
            .filter_map(|o| o.result())
            .flat_map(|r| r.anomalies.iter().cloned())
            .collect();
        all.sort_by(|a, b| b.severity.cmp(&a.severity));
        all.truncate(limit);
        all
    }
}
