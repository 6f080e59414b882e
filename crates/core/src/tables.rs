//! Closed catalog of the validated IDX datasets.
//!
//! Table kinds are a fixed enum: rule dispatch and registry lookups key on
//! the variant, never on runtime strings. The slug is the upstream table
//! name used by the data service.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Table kind ──────────────────────────────────────────────────────

/// The six dataset kinds covered by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    AnnualFinancials,
    QuarterlyFinancials,
    DailyPrices,
    Dividends,
    Filings,
    StockSplits,
}

impl TableKind {
    /// Every kind, in registry order.
    pub const ALL: [TableKind; 6] = [
        TableKind::AnnualFinancials,
        TableKind::QuarterlyFinancials,
        TableKind::DailyPrices,
        TableKind::Dividends,
        TableKind::Filings,
        TableKind::StockSplits,
    ];

    /// Upstream table name in the data service.
    pub fn slug(&self) -> &'static str {
        match self {
            TableKind::AnnualFinancials => "idx_combine_financials_annual",
            TableKind::QuarterlyFinancials => "idx_combine_financials_quarterly",
            TableKind::DailyPrices => "idx_daily_data",
            TableKind::Dividends => "idx_dividend",
            TableKind::Filings => "idx_filings",
            TableKind::StockSplits => "idx_stock_split",
        }
    }

    /// Human label for dashboards and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::AnnualFinancials => "Annual financials",
            TableKind::QuarterlyFinancials => "Quarterly financials",
            TableKind::DailyPrices => "Daily prices",
            TableKind::Dividends => "Dividends",
            TableKind::Filings => "Filings",
            TableKind::StockSplits => "Stock splits",
        }
    }

    /// Column the data service filters the window on.
    pub fn date_column(&self) -> &'static str {
        match self {
            TableKind::Filings => "timestamp",
            _ => "date",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .iter()
            .copied()
            .find(|k| k.slug() == s)
            .ok_or_else(|| format!("unknown table: '{s}'"))
    }
}

// ── Registry ────────────────────────────────────────────────────────

/// Snapshot of one registry entry, safe to hand to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub kind: TableKind,
    pub label: String,
    pub last_validated: Option<DateTime<Utc>>,
}

struct TableEntry {
    kind: TableKind,
    // Per-table lock: one writer at a time, held only for the in-memory
    // update, never across I/O.
    last_validated: Mutex<Option<DateTime<Utc>>>,
}

/// Fixed-order catalog of validated tables with last-validated timestamps.
///
/// The timestamp is bumped on every attempted run, success or failure, so
/// staleness is always observable.
pub struct TableRegistry {
    entries: Vec<TableEntry>,
}

impl TableRegistry {
    /// Registry over all six kinds.
    pub fn standard() -> Self {
        Self {
            entries: TableKind::ALL
                .iter()
                .map(|&kind| TableEntry {
                    kind,
                    last_validated: Mutex::new(None),
                })
                .collect(),
        }
    }

    /// Registered kinds in catalog order.
    pub fn kinds(&self) -> Vec<TableKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    /// Owned snapshot of all descriptors.
    pub fn descriptors(&self) -> Vec<TableDescriptor> {
        self.entries
            .iter()
            .map(|e| TableDescriptor {
                kind: e.kind,
                label: e.kind.label().to_string(),
                last_validated: *e.last_validated.lock().expect("registry lock poisoned"),
            })
            .collect()
    }

    pub fn last_validated(&self, kind: TableKind) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .and_then(|e| *e.last_validated.lock().expect("registry lock poisoned"))
    }

    /// Record an attempted run for `kind`.
    pub fn mark_validated(&self, kind: TableKind, at: DateTime<Utc>) {
        if let Some(entry) = self.entries.iter().find(|e| e.kind == kind) {
            *entry.last_validated.lock().expect("registry lock poisoned") = Some(at);
        }
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
