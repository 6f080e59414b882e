//! Two-tier read strategy: remote store first, local cache on store error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use idxwatch_core::ValidationResult;

use crate::cache::ResultCache;
use crate::reader::ResultReader;

/// Where a read was actually served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    Store,
    Cache,
}

impl ReadSource {
    pub fn is_cache(&self) -> bool {
        matches!(self, ReadSource::Cache)
    }
}

/// Tries the remote reader and falls back to the local cache on a declared
/// store error. The fallback is transparent to the caller: degradation is
/// an observable flag, not an error.
pub struct FallbackReader {
    remote: Arc<dyn ResultReader>,
    cache: Arc<ResultCache>,
}

impl FallbackReader {
    pub fn new(remote: Arc<dyn ResultReader>, cache: Arc<ResultCache>) -> Self {
        Self { remote, cache }
    }

    /// Never fails: a remote error switches to the cache, which is
    /// infallible in-memory data.
    pub async fn read_recent(&self, limit: usize) -> (Vec<ValidationResult>, ReadSource) {
        match self.remote.read_recent(limit).await {
            Ok(results) => (results, ReadSource::Store),
            Err(e) => {
                warn!(error = %e, "result store unreachable, serving from local cache");
                (self.cache.recent(limit), ReadSource::Cache)
            }
        }
    }
}
