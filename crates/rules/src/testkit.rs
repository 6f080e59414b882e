//! Shared fixtures for rule tests.

use chrono::NaiveDate;
use idxwatch_core::{
    DailyPriceRow, DateRange, DividendRow, FilingRow, FinancialRow, StockSplitRow,
    ValidationConfig,
};

use crate::rule::RuleContext;

pub(crate) fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Context over `[start, end]` with `today` pinned to the window end.
pub(crate) fn ctx_for(start: &str, end: &str) -> RuleContext {
    let range = DateRange::new(Some(d(start)), Some(d(end))).unwrap();
    RuleContext::new(range, d(end), &ValidationConfig::default())
}

pub(crate) fn daily_row(symbol: &str, date: &str, close: f64) -> DailyPriceRow {
    DailyPriceRow {
        symbol: symbol.to_string(),
        date: Some(d(date)),
        close: Some(close),
        volume: Some(1_000_000.0),
        ..Default::default()
    }
}

pub(crate) fn dividend_row(symbol: &str, date: &str, yield_value: f64) -> DividendRow {
    DividendRow {
        symbol: symbol.to_string(),
        date: Some(d(date)),
        dividend: Some(100.0),
        yield_value: Some(yield_value),
    }
}

pub(crate) fn fin_row(symbol: &str, date: &str) -> FinancialRow {
    FinancialRow {
        symbol: symbol.to_string(),
        date: Some(d(date)),
        ..Default::default()
    }
}

pub(crate) fn filing_row(ticker: &str, timestamp: &str, price: f64) -> FilingRow {
    FilingRow {
        tickers: vec![ticker.to_string()],
        timestamp: Some(timestamp.parse().unwrap()),
        price: Some(price),
        title: None,
    }
}

pub(crate) fn split_row(symbol: &str, date: &str, ratio: f64) -> StockSplitRow {
    StockSplitRow {
        symbol: symbol.to_string(),
        date: Some(d(date)),
        split_ratio: Some(ratio),
    }
}
