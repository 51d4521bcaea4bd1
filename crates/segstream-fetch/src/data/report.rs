use std::fmt;
use std::time::Duration;

use crate::error::{FetchError, Result, StreamError};

/// Why a stream run stopped without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The segment at `index` exhausted its retry budget.
    FetchFailed { index: u64, error: FetchError },
    /// The worker owning `index` closed its channel before delivering it.
    ChannelClosed { worker: usize, index: u64 },
    /// The run was cancelled while waiting for `index`.
    Cancelled { index: u64 },
}

impl StopReason {
    /// First index that was not written.
    pub fn index(&self) -> u64 {
        match self {
            StopReason::FetchFailed { index, .. }
            | StopReason::ChannelClosed { index, .. }
            | StopReason::Cancelled { index } => *index,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::FetchFailed { index, error } => {
                write!(f, "segment {index} failed: {error}")
            }
            StopReason::ChannelClosed { worker, index } => {
                write!(f, "worker {worker} closed its channel at index {index}")
            }
            StopReason::Cancelled { index } => write!(f, "cancelled at index {index}"),
        }
    }
}

/// "Ran from `start_index` until `next_index`, then stopped for `stop`."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub start_index: u64,
    /// First index not written; equals `stop.index()`.
    pub next_index: u64,
    pub segments_written: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
    pub stop: StopReason,
}

impl StreamReport {
    pub fn megabytes_written(&self) -> f64 {
        self.bytes_written as f64 / 1024.0 / 1024.0
    }

    /// Turns a stop on a fetch failure into an error, for callers that treat
    /// an exhausted segment as a failed run.
    pub fn ensure_complete(self) -> Result<Self> {
        match self.stop {
            StopReason::FetchFailed { index, error } => {
                Err(StreamError::FetchFailed { index, source: error })
            }
            _ => Ok(self),
        }
    }
}
