//! Immutable data types for segment streaming.
//!
//! Configuration, per-segment records and the run report. Nothing in here
//! performs I/O; values are built once and handed to the effect layer.

pub mod options;
pub mod progress;
pub mod report;
pub mod segment;

pub use options::{Backoff, ProgressCallback, RetryPolicy, StreamConfig};
pub use progress::Progress;
pub use report::{StopReason, StreamReport};
pub use segment::{FetchResult, SegmentRequest};
