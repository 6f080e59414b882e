//! The `Rule` capability and the evaluation context shared by all checks.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use idxwatch_core::{Anomaly, DataSlice, DateRange, Severity, TableKind, ValidationConfig};

/// A single rule errored internally while evaluating.
///
/// Caught per-rule by the validator and converted into a synthetic critical
/// anomaly; the remaining rules still run.
#[derive(Debug, Error)]
#[error("rule '{rule}' failed: {detail}")]
pub struct RuleEvaluationError {
    pub rule: String,
    pub detail: String,
}

/// Inputs shared by every rule evaluation.
///
/// `today` is injected rather than read from the clock so evaluations are
/// pure functions of their inputs. `daily_close` is the reference lookup the
/// validator populates for cross-table checks (filing price vs daily close).
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub range: DateRange,
    pub today: NaiveDate,
    pub outlier_sigma: f64,
    pub outlier_window: usize,
    pub daily_close: HashMap<(String, NaiveDate), f64>,
}

impl RuleContext {
    pub fn new(range: DateRange, today: NaiveDate, cfg: &ValidationConfig) -> Self {
        Self {
            range,
            today,
            outlier_sigma: cfg.outlier_sigma,
            outlier_window: cfg.outlier_window,
            daily_close: HashMap::new(),
        }
    }

    pub fn with_daily_close(mut self, close: HashMap<(String, NaiveDate), f64>) -> Self {
        self.daily_close = close;
        self
    }

    /// Dates are only attached to anomalies when inside the validated window;
    /// out-of-window findings carry the offending date in the message.
    pub fn anomaly_date(&self, date: Option<NaiveDate>) -> Option<NaiveDate> {
        date.filter(|d| self.range.contains(*d))
    }
}

/// A named, stateless check over one data slice.
///
/// Rules never mutate input and never panic on malformed rows; malformed
/// rows are reported as anomalies. An `Err` is reserved for internal
/// evaluation failures and is isolated per rule by the caller.
pub trait Rule: Send + Sync {
    /// Stable rule name, recorded on every anomaly it produces.
    fn name(&self) -> &'static str;

    /// Base severity of this rule's findings. Graded rules may emit
    /// individual anomalies above or below this.
    fn severity(&self) -> Severity;

    fn applies_to(&self, kind: TableKind) -> bool;

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError>;
}
