//! Error types for segstream-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single HTTP attempt. Always retryable within the attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("invalid request URL {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Terminal outcome of a [`Fetcher`](crate::Fetcher) invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("max retries exceeded ({attempts} attempts), last error: {last}")]
    RetriesExhausted { attempts: u32, last: AttemptError },

    #[error("fetch cancelled")]
    Cancelled,
}

/// Fatal conditions that abort a stream run.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to open output file {path}: {source}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("out of order result: expected {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("failed to write data for index {index}: {source}")]
    Write {
        index: u64,
        #[source]
        source: io::Error,
    },

    #[error("segment {index} failed: {source}")]
    FetchFailed {
        index: u64,
        #[source]
        source: FetchError,
    },

    #[error("worker task failed: {0}")]
    Join(String),
}

pub type Result<T, E = StreamError> = std::result::Result<T, E>;
