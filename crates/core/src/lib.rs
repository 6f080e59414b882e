//! Domain model for IDX dataset validation.
//!
//! This crate provides:
//! - The closed [`TableKind`] catalog and the [`TableRegistry`]
//! - Typed row models and the tagged [`DataSlice`]
//! - [`Anomaly`], [`ValidationResult`], and [`RunSummary`] records
//! - The [`DataSource`] capability consumed by the validator
//! - Environment-driven configuration

pub mod config;
pub mod range;
pub mod result;
pub mod rows;
pub mod source;
pub mod tables;

pub use config::{Config, DataServiceConfig, EmailConfig, ValidationConfig};
pub use range::{DateRange, InvalidRange};
pub use result::{
    Anomaly, RunSummary, Severity, SeverityCounts, TableOutcome, ValidationResult,
    ValidationStatus,
};
pub use rows::{
    DailyPriceRow, DataSlice, DividendRow, FilingRow, FinancialRow, StockSplitRow,
};
pub use source::{DataSource, FetchError};
pub use tables::{TableDescriptor, TableKind, TableRegistry};
