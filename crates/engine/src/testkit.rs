//! Mock collaborators and fixtures shared across engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use idxwatch_core::{
    DailyPriceRow, DataSlice, DataSource, DateRange, FetchError, TableKind, ValidationResult,
};
use idxwatch_notify::{AnomalySummary, Notifier, NotifyError};
use idxwatch_store::{ResultStore, StoreError};

pub(crate) fn daily_row(symbol: &str, date: &str, close: f64) -> DailyPriceRow {
    DailyPriceRow {
        symbol: symbol.to_string(),
        date: Some(date.parse().unwrap()),
        close: Some(close),
        volume: Some(1_000_000.0),
        ..Default::default()
    }
}

/// Ten calm trading days in January 2024.
pub(crate) fn daily_slice() -> DataSlice {
    DataSlice::DailyPrices(
        (1..=10)
            .map(|day| daily_row("BBCA.JK", &format!("2024-01-{day:02}"), 9000.0 + day as f64))
            .collect(),
    )
}

/// Two rows, one missing its close price.
pub(crate) fn null_close_slice() -> DataSlice {
    let mut broken = daily_row("BBCA.JK", "2024-01-15", 0.0);
    broken.close = None;
    DataSlice::DailyPrices(vec![daily_row("BBCA.JK", "2024-01-16", 9100.0), broken])
}

/// A slice with enough warning-level movement to trigger notification.
pub(crate) fn spiking_slice() -> DataSlice {
    DataSlice::DailyPrices(vec![
        daily_row("GOTO.JK", "2024-01-10", 100.0),
        daily_row("GOTO.JK", "2024-01-11", 150.0),
        daily_row("GOTO.JK", "2024-01-12", 90.0),
        daily_row("GOTO.JK", "2024-01-15", 140.0),
        daily_row("GOTO.JK", "2024-01-16", 85.0),
        daily_row("GOTO.JK", "2024-01-17", 130.0),
    ])
}

// ── Data source fakes ───────────────────────────────────────────────

/// Serves a fixed slice for its kind and empty slices for everything else.
pub(crate) struct StaticSource {
    slice: DataSlice,
}

impl StaticSource {
    pub(crate) fn new(slice: DataSlice) -> Self {
        Self { slice }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self, table: TableKind, _range: DateRange) -> Result<DataSlice, FetchError> {
        if table == self.slice.kind() {
            Ok(self.slice.clone())
        } else {
            Ok(DataSlice::empty(table))
        }
    }
}

/// Always unreachable.
pub(crate) struct FailingSource;

#[async_trait]
impl DataSource for FailingSource {
    async fn fetch(&self, table: TableKind, _range: DateRange) -> Result<DataSlice, FetchError> {
        Err(FetchError::Transport(format!(
            "connection refused fetching '{table}'"
        )))
    }
}

/// Fails fetches for exactly one table, succeeds (empty) for the rest.
pub(crate) struct PartiallyFailingSource {
    pub(crate) failing: TableKind,
}

#[async_trait]
impl DataSource for PartiallyFailingSource {
    async fn fetch(&self, table: TableKind, _range: DateRange) -> Result<DataSlice, FetchError> {
        if table == self.failing {
            Err(FetchError::Transport(format!(
                "connection refused fetching '{table}'"
            )))
        } else {
            Ok(DataSlice::empty(table))
        }
    }
}

// ── Store fakes ─────────────────────────────────────────────────────

/// Accepts every write, counting them.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) writes: AtomicUsize,
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn write(&self, _result: &ValidationResult) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects every write.
pub(crate) struct FailingStore;

#[async_trait]
impl ResultStore for FailingStore {
    async fn write(&self, _result: &ValidationResult) -> Result<(), StoreError> {
        Err(StoreError::Status { code: 503 })
    }
}

// ── Notifier fakes ──────────────────────────────────────────────────

/// Records how many times it was invoked.
#[derive(Default)]
pub(crate) struct CountingNotifier {
    pub(crate) sends: Arc<AtomicUsize>,
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send(&self, _summary: &AnomalySummary) -> Result<(), NotifyError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "counting"
    }
}

/// Always fails delivery.
pub(crate) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _summary: &AnomalySummary) -> Result<(), NotifyError> {
        Err(NotifyError::Smtp("relay unavailable".to_string()))
    }

    fn channel_name(&self) -> &str {
        "failing"
    }
}
