use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;
use crate::error::{Result, StreamError};

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The same delay after every failed attempt.
    #[default]
    Fixed,
    /// `delay * 2^(attempt - 1)`.
    Exponential,
}

/// Attempt budget of a single segment fetch.
///
/// # Examples
///
/// ```
/// use segstream_fetch::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default().delay(Duration::from_millis(250));
/// assert_eq!(policy.max_attempts, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    ///
    /// Default: 3
    pub max_attempts: u32,

    /// Sleep between a failed attempt and the next one.
    ///
    /// Default: 1s
    pub delay: Duration,

    /// Default: [`Backoff::Fixed`]
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Immutable per-run settings of a segment stream.
///
/// Built once at startup and shared read-only between the workers and the
/// collector. URL construction is not part of it; see
/// [`SegmentLocator`](crate::SegmentLocator).
///
/// # Examples
///
/// ```
/// use segstream_fetch::StreamConfig;
/// use std::time::Duration;
///
/// let config = StreamConfig::new("output/session.ts")
///     .workers(4)
///     .interval_ms(200)
///     .timeout(Duration::from_secs(20))
///     .header("Referer", "https://disk.yandex.ru/");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct StreamConfig {
    /// Headers sent with every request, including retries.
    pub headers: Arc<[(String, String)]>,

    /// Upper bound (exclusive) of the random sleep between iterations.
    ///
    /// Default: 200
    pub interval_ms: u64,

    /// Bound on a single HTTP attempt, body included.
    ///
    /// Default: 20s
    pub timeout: Duration,

    /// Number of concurrent workers. Also the stride of each worker.
    ///
    /// Default: 1
    pub workers: usize,

    /// Output sink, opened in append mode.
    pub output: PathBuf,

    /// Index of the first segment to fetch.
    ///
    /// Default: 0
    pub start_index: u64,

    /// Capacity of each worker's result channel.
    ///
    /// Default: 20
    pub channel_capacity: usize,

    /// Default: [`RetryPolicy::default`]
    pub retry: RetryPolicy,

    /// Invoked after each segment is written to the sink.
    ///
    /// Default: None
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("headers", &self.headers)
            .field("interval_ms", &self.interval_ms)
            .field("timeout", &self.timeout)
            .field("workers", &self.workers)
            .field("output", &self.output)
            .field("start_index", &self.start_index)
            .field("channel_capacity", &self.channel_capacity)
            .field("retry", &self.retry)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl StreamConfig {
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 20;

    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            headers: Arc::new([]),
            interval_ms: 200,
            timeout: Duration::from_secs(20),
            workers: 1,
            output: output.into(),
            start_index: 0,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
            retry: RetryPolicy::default(),
            on_progress: None,
        }
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replaces any existing headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn start_index(mut self, start_index: u64) -> Self {
        self.start_index = start_index;
        self
    }

    #[must_use]
    pub fn channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(StreamError::InvalidConfig(
                "worker count must be greater than 0".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(StreamError::InvalidConfig(
                "channel capacity must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(StreamError::InvalidConfig(
                "retry policy needs at least one attempt".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn report_progress(&self, progress: Progress) {
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }
}
