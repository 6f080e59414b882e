//! Per-run anomaly summary payload and its plain-text rendering.
//!
//! One summary is built per run (single table or all tables) so stakeholders
//! get a single email per anomalous run instead of one per anomaly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use idxwatch_core::{
    Anomaly, RunSummary, Severity, SeverityCounts, TableKind, ValidationResult, ValidationStatus,
};

use crate::traits::NotifyError;

/// How many anomalies a summary carries at most.
const TOP_ANOMALY_LIMIT: usize = 10;

/// One table's line in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAlert {
    pub table: TableKind,
    pub label: String,
    pub status: ValidationStatus,
    pub counts: SeverityCounts,
}

/// The notification payload for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySummary {
    /// What was validated: a table label or "all tables".
    pub scope: String,
    pub generated_at: DateTime<Utc>,
    pub tables: Vec<TableAlert>,
    pub totals: SeverityCounts,
    /// Severity-ranked findings, capped.
    pub top_anomalies: Vec<Anomaly>,
}

impl AnomalySummary {
    pub fn from_result(result: &ValidationResult) -> Self {
        let counts = result.severity_counts();
        let mut top = result.anomalies.clone();
        top.sort_by(|a, b| b.severity.cmp(&a.severity));
        top.truncate(TOP_ANOMALY_LIMIT);

        Self {
            scope: result.table.label().to_string(),
            generated_at: result.executed_at,
            tables: vec![TableAlert {
                table: result.table,
                label: result.table.label().to_string(),
                status: result.status,
                counts,
            }],
            totals: counts,
            top_anomalies: top,
        }
    }

    pub fn from_run(run: &RunSummary) -> Self {
        let tables = run
            .tables
            .iter()
            .map(|(&kind, outcome)| match outcome.result() {
                Some(result) => TableAlert {
                    table: kind,
                    label: kind.label().to_string(),
                    status: result.status,
                    counts: result.severity_counts(),
                },
                None => TableAlert {
                    table: kind,
                    label: kind.label().to_string(),
                    status: ValidationStatus::Failed,
                    counts: SeverityCounts::default(),
                },
            })
            .collect();

        Self {
            scope: "all tables".to_string(),
            generated_at: run.finished_at,
            tables,
            totals: run.severity_counts(),
            top_anomalies: run.top_anomalies(TOP_ANOMALY_LIMIT),
        }
    }

    /// Highest severity carried, driving the subject prefix.
    pub fn top_severity(&self) -> Option<Severity> {
        self.top_anomalies.first().map(|a| a.severity)
    }

    /// Subject line, prefixed by the dominant severity.
    pub fn subject(&self) -> String {
        let prefix = match self.top_severity() {
            Some(Severity::Critical) => "[CRITICAL]",
            Some(Severity::Warning) => "[WARNING]",
            _ => "[INFO]",
        };
        format!(
            "{prefix} IDX validation: {} anomalies in {}",
            self.totals.total(),
            self.scope
        )
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Plain-text body template. Email markup is out of scope; the text reads
/// fine in any client.
const BODY_TEMPLATE: &str = "\
IDX data validation alert: {{ scope }}
Generated: {{ generated_at }}

Totals: {{ totals.critical }} critical / {{ totals.warning }} warning / {{ totals.info }} info

Tables:
{% for t in tables %}  - {{ t.label }}: {{ t.status }} ({{ t.counts.critical }} critical, {{ t.counts.warning }} warning, {{ t.counts.info }} info)
{% endfor %}
Top anomalies:
{% for a in top_anomalies %}  - [{{ a.severity }}] {{ a.message }}
{% endfor %}";

/// Render the plain-text body for a summary.
pub fn render_body(summary: &AnomalySummary) -> Result<String, NotifyError> {
    let env = minijinja::Environment::new();
    env.render_str(BODY_TEMPLATE, summary)
        .map_err(|e| NotifyError::Template(e.to_string()))
}
