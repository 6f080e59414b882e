//! Result read/write capabilities.

use async_trait::async_trait;

use idxwatch_core::ValidationResult;

use crate::error::StoreError;

/// Write access to the authoritative result store.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn write(&self, result: &ValidationResult) -> Result<(), StoreError>;
}

/// Read access to persisted results, newest first.
///
/// Two implementations exist: the remote store adapter and the local cache.
/// The dashboard composes them through [`crate::FallbackReader`] so a store
/// outage degrades to cached data instead of an error.
#[async_trait]
pub trait ResultReader: Send + Sync {
    async fn read_recent(&self, limit: usize) -> Result<Vec<ValidationResult>, StoreError>;
}
