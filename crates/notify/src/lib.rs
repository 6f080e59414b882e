//! Notification engine for validation alerts.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - The per-run `AnomalySummary` payload and its plain-text rendering
//! - SMTP email notifier (lettre) and a no-op fallback channel

pub mod email;
pub mod summary;
pub mod traits;

pub use email::EmailNotifier;
pub use summary::{AnomalySummary, TableAlert};
pub use traits::{NoopNotifier, Notifier, NotifyError};
