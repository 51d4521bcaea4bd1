//! Parallel segment fetching with strictly ordered reassembly.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and per-segment records
//! - [`core`] - Pure transformations (retry delay, jitter, stride partition)
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Ordered Output**: N workers fetch disjoint residue classes of the index
//!   space; a single collector writes segments in ascending order only
//! - **Bounded Retry**: every segment gets a fixed attempt budget
//! - **Backpressure**: per-worker bounded channels throttle fetching to the
//!   write rate
//! - **All-or-Nothing Past Failure**: the first gap at the expected index ends
//!   the stream; nothing after it is written
//! - **Explicit Cancellation**: a `CancellationToken` is threaded through
//!   every await point

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{StridePartition, jitter_delay, retry_delay};
pub use data::{
    Backoff, FetchResult, Progress, ProgressCallback, RetryPolicy, SegmentRequest, StopReason,
    StreamConfig, StreamReport,
};
pub use effects::{
    Fetcher, HttpClient, HttpResponse, OrderedCollector, SegmentLocator, SegmentPool,
    SequentialFetch,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{AttemptError, FetchError, Result, StreamError};
pub use tokio_util::sync::CancellationToken;
