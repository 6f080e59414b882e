//! Bounded in-memory mirror of recent validation results.

use std::collections::VecDeque;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use idxwatch_core::ValidationResult;

use crate::error::StoreError;
use crate::reader::ResultReader;

/// Local fallback cache: the last `capacity` results, execution-timestamp
/// descending, oldest evicted on overflow.
///
/// Populated opportunistically on every produced result; only ever read when
/// the remote store is unreachable. Holds copies only; the store remains the
/// authoritative record. The lock guards the in-memory deque only and is
/// never held across I/O.
pub struct ResultCache {
    entries: RwLock<VecDeque<ValidationResult>>,
    capacity: usize,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Insert a result, keeping timestamp-descending order and the bound.
    pub fn insert(&self, result: ValidationResult) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let position = entries
            .iter()
            .position(|r| r.executed_at <= result.executed_at)
            .unwrap_or(entries.len());
        entries.insert(position, result);
        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop_back() {
                debug!(
                    table = %evicted.table,
                    run_id = %evicted.run_id,
                    "evicting oldest cached result"
                );
            }
        }
    }

    /// Newest-first snapshot of up to `limit` results.
    pub fn recent(&self, limit: usize) -> Vec<ValidationResult> {
        let entries = self.entries.read().expect("cache lock poisoned");
        entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultReader for ResultCache {
    /// Cache reads are infallible; the `Result` satisfies the capability.
    async fn read_recent(&self, limit: usize) -> Result<Vec<ValidationResult>, StoreError> {
        Ok(self.recent(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use idxwatch_core::{DateRange, TableKind, ValidationStatus};
    use uuid::Uuid;

    fn result_at(offset_secs: i64) -> ValidationResult {
        ValidationResult {
            run_id: Uuid::new_v4(),
            table: TableKind::DailyPrices,
            range: DateRange::unbounded(),
            executed_at: Utc::now() + Duration::seconds(offset_secs),
            status: ValidationStatus::Success,
            anomalies: Vec::new(),
            rows_processed: 0,
            duration_ms: 1,
            degraded_persistence: false,
            error: None,
        }
    }

    #[test]
    fn newest_first_regardless_of_insert_order() {
        let cache = ResultCache::new(10);
        let older = result_at(-60);
        let newer = result_at(0);
        let older_id = older.run_id;
        let newer_id = newer.run_id;

        cache.insert(older);
        cache.insert(newer);

        let recent = cache.recent(10);
        assert_eq!(recent[0].run_id, newer_id);
        assert_eq!(recent[1].run_id, older_id);

        // Same outcome inserting newest first.
        let cache = ResultCache::new(10);
        let older = result_at(-60);
        let newer = result_at(0);
        let newer_id = newer.run_id;
        cache.insert(newer);
        cache.insert(older);
        assert_eq!(cache.recent(10)[0].run_id, newer_id);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let cache = ResultCache::new(3);
        let oldest = result_at(-300);
        let oldest_id = oldest.run_id;
        cache.insert(oldest);
        for offset in [-200, -100, 0] {
            cache.insert(result_at(offset));
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.recent(10).iter().all(|r| r.run_id != oldest_id));
    }

    #[test]
    fn recent_respects_limit() {
        let cache = ResultCache::new(10);
        for offset in [-30, -20, -10] {
            cache.insert(result_at(offset));
        }
        assert_eq!(cache.recent(2).len(), 2);
    }
}
