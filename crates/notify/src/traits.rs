//! Notifier trait definition and shared error types.

use async_trait::async_trait;

use crate::summary::AnomalySummary;

/// Errors that can occur during notification delivery. Always absorbed by
/// the orchestrator: a run's success never depends on delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Trait for notification channel implementations.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one per-run anomaly summary through this channel.
    async fn send(&self, summary: &AnomalySummary) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;
}

/// Channel used when no recipients are configured: logs and succeeds.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, summary: &AnomalySummary) -> Result<(), NotifyError> {
        tracing::info!(
            scope = %summary.scope,
            anomalies = summary.totals.total(),
            "no notification channel configured, skipping dispatch"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "noop"
    }
}
