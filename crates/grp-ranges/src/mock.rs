//! Range sources for tests: fixed lists and forced failures, no network.

use grp_types::{RangeFetchError, RangeSource};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns the same ranges on every call and counts fetches.
pub struct StaticRangeSource {
    ranges: Vec<String>,
    fetches: AtomicUsize,
}

impl StaticRangeSource {
    pub fn new<S: Into<String>>(ranges: impl IntoIterator<Item = S>) -> Self {
        Self {
            ranges: ranges.into_iter().map(Into::into).collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RangeSource for StaticRangeSource {
    async fn fetch_ranges(&self) -> Result<Vec<String>, RangeFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.ranges.clone())
    }
}

/// Always fails as if the range host were unreachable.
pub struct FailingRangeSource;

#[async_trait::async_trait]
impl RangeSource for FailingRangeSource {
    async fn fetch_ranges(&self) -> Result<Vec<String>, RangeFetchError> {
        Err(RangeFetchError::Http("connection refused".to_string()))
    }
}
