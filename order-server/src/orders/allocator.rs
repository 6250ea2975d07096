//! Order Number Allocator.
//!
//! Produces per-store, date-scoped sequential numbers: the store-day's
//! effective date concatenated with a zero-padded sequence. The sequence is
//! an atomically incremented counter per (store, date) — never a count
//! query, which is racy under concurrency. Two concurrent allocations for
//! the same store-day can therefore never produce the same number; the
//! DashMap entry lock is the serialization point.

use chrono::NaiveDate;
use dashmap::DashMap;

/// 每店每营业日独立计数
#[derive(Debug, Default)]
pub struct OrderNumberAllocator {
    counters: DashMap<(String, NaiveDate), u64>,
}

impl OrderNumberAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next number for a store-day.
    pub fn allocate(&self, store_id: &str, as_of: NaiveDate) -> String {
        let mut counter = self
            .counters
            .entry((store_id.to_string(), as_of))
            .or_insert(0);
        *counter += 1;
        let sequence = *counter;
        drop(counter);

        format!("{}{:04}", as_of.format("%Y%m%d"), sequence)
    }
}
