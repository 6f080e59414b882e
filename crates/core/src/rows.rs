//! Typed row models for each dataset, as decoded from the data service.
//!
//! Nullable upstream columns map to `Option` fields: decoding never fails
//! on a missing value; completeness rules report the gap instead.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::tables::TableKind;

// ── Row types ───────────────────────────────────────────────────────

/// One statement row from the annual or quarterly financials tables.
///
/// Annual rows populate `revenue`; quarterly rows populate `total_revenue`.
/// The banking fields are only present for bank issuers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub revenue: Option<f64>,
    pub total_revenue: Option<f64>,
    pub earnings: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_equity: Option<f64>,
    pub gross_loan: Option<f64>,
    pub allowance_for_loans: Option<f64>,
    pub net_loan: Option<f64>,
    pub earnings_before_tax: Option<f64>,
    pub tax: Option<f64>,
    pub minorities: Option<f64>,
    pub net_operating_cash_flow: Option<f64>,
    pub net_investing_cash_flow: Option<f64>,
    pub net_financing_cash_flow: Option<f64>,
    pub net_cash_flow: Option<f64>,
    pub total_deposit: Option<f64>,
    pub current_account: Option<f64>,
    pub savings_account: Option<f64>,
    pub time_deposit: Option<f64>,
    pub total_capital: Option<f64>,
    pub total_risk_weighted_asset: Option<f64>,
    pub net_interest_income: Option<f64>,
    pub non_interest_income: Option<f64>,
    pub operating_expense: Option<f64>,
}

/// One trading day for one symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyPriceRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// One dividend distribution (dated by ex-date).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub dividend: Option<f64>,
    #[serde(rename = "yield")]
    pub yield_value: Option<f64>,
}

/// One exchange filing, possibly covering several tickers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingRow {
    pub tickers: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub price: Option<f64>,
    pub title: Option<String>,
}

impl FilingRow {
    /// Calendar date of the filing, if timestamped.
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date_naive())
    }
}

/// One corporate-action stock split.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockSplitRow {
    pub symbol: String,
    pub date: Option<NaiveDate>,
    pub split_ratio: Option<f64>,
}

// ── Data slice ──────────────────────────────────────────────────────

/// The fetched rows for one table, tagged by kind.
///
/// Rules dispatch on the variant; there is no stringly-typed table lookup
/// past the fetch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSlice {
    AnnualFinancials(Vec<FinancialRow>),
    QuarterlyFinancials(Vec<FinancialRow>),
    DailyPrices(Vec<DailyPriceRow>),
    Dividends(Vec<DividendRow>),
    Filings(Vec<FilingRow>),
    StockSplits(Vec<StockSplitRow>),
}

impl DataSlice {
    pub fn kind(&self) -> TableKind {
        match self {
            DataSlice::AnnualFinancials(_) => TableKind::AnnualFinancials,
            DataSlice::QuarterlyFinancials(_) => TableKind::QuarterlyFinancials,
            DataSlice::DailyPrices(_) => TableKind::DailyPrices,
            DataSlice::Dividends(_) => TableKind::Dividends,
            DataSlice::Filings(_) => TableKind::Filings,
            DataSlice::StockSplits(_) => TableKind::StockSplits,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => rows.len(),
            DataSlice::DailyPrices(rows) => rows.len(),
            DataSlice::Dividends(rows) => rows.len(),
            DataSlice::Filings(rows) => rows.len(),
            DataSlice::StockSplits(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// An empty slice of the given kind.
    pub fn empty(kind: TableKind) -> Self {
        match kind {
            TableKind::AnnualFinancials => DataSlice::AnnualFinancials(Vec::new()),
            TableKind::QuarterlyFinancials => DataSlice::QuarterlyFinancials(Vec::new()),
            TableKind::DailyPrices => DataSlice::DailyPrices(Vec::new()),
            TableKind::Dividends => DataSlice::Dividends(Vec::new()),
            TableKind::Filings => DataSlice::Filings(Vec::new()),
            TableKind::StockSplits => DataSlice::StockSplits(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dividend_yield_column_is_renamed() {
        let row: DividendRow =
            serde_json::from_str(r#"{"symbol":"BBCA.JK","date":"2024-03-01","yield":0.04}"#)
                .unwrap();
        assert_eq!(row.yield_value, Some(0.04));
        assert!(row.dividend.is_none());
    }

    #[test]
    fn missing_columns_decode_as_none() {
        let row: DailyPriceRow = serde_json::from_str(r#"{"symbol":"TLKM.JK"}"#).unwrap();
        assert!(row.close.is_none());
        assert!(row.date.is_none());
    }

    #[test]
    fn slice_kind_matches_variant() {
        for kind in TableKind::ALL {
            let slice = DataSlice::empty(kind);
            assert_eq!(slice.kind(), kind);
            assert!(slice.is_empty());
        }
    }
}
