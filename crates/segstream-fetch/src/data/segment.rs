use bytes::Bytes;

use crate::error::FetchError;

/// One fetch target, resolved fresh for every attempt cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRequest {
    pub index: u64,
    pub url: String,
}

impl SegmentRequest {
    pub fn new(index: u64, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }
}

/// Outcome of a worker iteration, consumed exactly once by the collector.
#[derive(Debug)]
pub struct FetchResult {
    pub index: u64,
    pub outcome: Result<Bytes, FetchError>,
}

impl FetchResult {
    pub fn success(index: u64, payload: Bytes) -> Self {
        Self {
            index,
            outcome: Ok(payload),
        }
    }

    pub fn failure(index: u64, error: FetchError) -> Self {
        Self {
            index,
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
