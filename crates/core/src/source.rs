//! Data source capability consumed by the validator.

use async_trait::async_trait;
use thiserror::Error;

use crate::range::DateRange;
use crate::rows::DataSlice;
use crate::tables::TableKind;

/// Errors surfaced by a data-source fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("data service request failed: {0}")]
    Transport(String),

    #[error("data service returned status {code} for '{table}'")]
    Status { table: TableKind, code: u16 },

    #[error("malformed payload for '{table}': {detail}")]
    Decode { table: TableKind, detail: String },

    #[error("fetch for '{table}' timed out after {seconds}s")]
    Timeout { table: TableKind, seconds: u64 },
}

/// Read access to the upstream datasets.
///
/// Implementations fetch the rows of one table restricted to the given
/// window (open bounds fetch everything on that side). Connectivity and
/// schema problems surface as [`FetchError`]; the validator maps them to a
/// `Failed` result.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, table: TableKind, range: DateRange) -> Result<DataSlice, FetchError>;
}
