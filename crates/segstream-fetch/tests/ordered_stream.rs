//! Scenario tests for the ordered segment stream.
//!
//! A mock HTTP client serves `/{index}.ts` from an in-memory table, with
//! optional per-index latency to scramble arrival order across workers.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use segstream_fetch::{
    AttemptError, CancellationToken, FetchError, FetchResult, HttpClient, HttpResponse,
    OrderedCollector, Progress, RetryPolicy, SegmentPool, SequentialFetch, StopReason,
    StreamConfig, StreamError, StridePartition,
};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug)]
struct TestError(String);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TestError {}

fn payload(index: u64) -> Vec<u8> {
    format!("<segment {index}>").into_bytes()
}

fn concat(indices: impl IntoIterator<Item = u64>) -> Vec<u8> {
    indices.into_iter().flat_map(payload).collect()
}

/// Serves segments below `available`; everything else is a 404.
///
/// Clones share their call counters, so a test can keep one handle while the
/// engine owns another.
#[derive(Clone, Default)]
struct SegmentServer {
    available: u64,
    latency: HashMap<u64, Duration>,
    crash_at: Option<u64>,
    calls: Arc<Mutex<HashMap<u64, usize>>>,
}

impl SegmentServer {
    fn new(available: u64) -> Self {
        Self {
            available,
            ..Default::default()
        }
    }

    fn with_latency(mut self, index: u64, latency: Duration) -> Self {
        self.latency.insert(index, latency);
        self
    }

    /// Panics inside the request for `index`, taking its worker down.
    fn crashing_at(mut self, index: u64) -> Self {
        self.crash_at = Some(index);
        self
    }

    fn calls(&self, index: u64) -> usize {
        self.calls.lock().unwrap().get(&index).copied().unwrap_or(0)
    }
}

fn parse_index(url: &Url) -> u64 {
    url.path()
        .rsplit('/')
        .next()
        .and_then(|name| name.strip_suffix(".ts"))
        .and_then(|n| n.parse().ok())
        .expect("segment url")
}

impl HttpClient for SegmentServer {
    type Error = TestError;

    async fn get(
        &self,
        url: &Url,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, Self::Error> {
        let index = parse_index(url);
        *self.calls.lock().unwrap().entry(index).or_default() += 1;
        if self.crash_at == Some(index) {
            panic!("segment server crashed serving {index}");
        }

        if let Some(latency) = self.latency.get(&index).copied() {
            tokio::time::sleep(latency).await;
        }
        if index < self.available {
            Ok(HttpResponse::ok(payload(index)))
        } else {
            Ok(HttpResponse::status(404))
        }
    }
}

fn locator(index: u64) -> String {
    format!("http://segments.test/stream/{index}.ts")
}

fn config(workers: usize) -> StreamConfig {
    StreamConfig::new("unused.ts")
        .workers(workers)
        .interval_ms(0)
        .retry(RetryPolicy::default().delay(Duration::ZERO))
}

#[tokio::test]
async fn sequential_stops_on_exhausted_segment() {
    let server = SegmentServer::new(3);
    let fetch = SequentialFetch::new(server.clone(), locator, config(1));
    let mut sink = Vec::new();

    let report = fetch
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(0..3));
    assert_eq!(report.next_index, 3);
    assert_eq!(report.segments_written, 3);
    assert_eq!(report.bytes_written, sink.len() as u64);
    assert_eq!(
        report.stop,
        StopReason::FetchFailed {
            index: 3,
            error: FetchError::RetriesExhausted {
                attempts: 3,
                last: AttemptError::Status(404),
            },
        }
    );
    assert_eq!(server.calls(3), 3);
}

#[tokio::test]
async fn single_worker_pool_matches_sequential() {
    let server = SegmentServer::new(3);
    let pool = SegmentPool::new(server.clone(), locator, config(1));
    let mut sink = Vec::new();

    let report = pool
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(0..3));
    assert!(matches!(report.stop, StopReason::FetchFailed { index: 3, .. }));
}

#[tokio::test]
async fn three_workers_write_in_index_order() {
    // Early indices are slow so later ones arrive first.
    let server = (0..9).fold(SegmentServer::new(9), |s, i| {
        s.with_latency(i, Duration::from_millis(5 * (9 - i)))
    });
    let pool = SegmentPool::new(server.clone(), locator, config(3));
    let mut sink = Vec::new();

    let report = pool
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(0..9));
    assert_eq!(report.next_index, 9);
    assert_eq!(report.segments_written, 9);
    assert!(matches!(report.stop, StopReason::FetchFailed { index: 9, .. }));
    for index in 0..9 {
        assert_eq!(server.calls(index), 1, "segment {index} fetched more than once");
    }
}

#[tokio::test]
async fn many_workers_cover_every_index_once() {
    let server = SegmentServer::new(40);
    let pool = SegmentPool::new(server.clone(), locator, config(7));
    let mut sink = Vec::new();

    let report = pool
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(0..40));
    assert_eq!(report.next_index, 40);
    for index in 0..40 {
        assert_eq!(server.calls(index), 1);
    }
}

#[tokio::test]
async fn pool_starts_at_offset_index() {
    let server = SegmentServer::new(17);
    let pool = SegmentPool::new(server.clone(), locator, config(3).start_index(10));
    let mut sink = Vec::new();

    let report = pool
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(10..17));
    assert_eq!(report.start_index, 10);
    assert_eq!(report.next_index, 17);
    assert_eq!(report.segments_written, 7);
    assert!(matches!(report.stop, StopReason::FetchFailed { index: 17, .. }));
    for index in 0..10 {
        assert_eq!(server.calls(index), 0, "segment {index} is before the start");
    }
}

#[tokio::test]
async fn worker_panic_surfaces_as_join_error() {
    let server = SegmentServer::new(100).crashing_at(4);
    let pool = SegmentPool::new(server.clone(), locator, config(3));
    let mut sink = Vec::new();

    let err = pool
        .run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Join(_)), "unexpected error {err:?}");
    assert_eq!(sink, concat(0..4));
    assert_eq!(server.calls(4), 1);
}

#[tokio::test]
async fn collector_stops_at_gap_and_drops_buffered_results() {
    let (tx0, rx0) = mpsc::channel(4);
    let (tx1, rx1) = mpsc::channel(4);
    tx0.send(FetchResult::success(0, Bytes::from(payload(0)))).await.unwrap();
    tx0.send(FetchResult::success(2, Bytes::from(payload(2)))).await.unwrap();
    drop(tx1);

    let mut sink = Vec::new();
    let report = OrderedCollector::new(&mut sink, StridePartition::new(0, 2))
        .run(vec![rx0, rx1], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, payload(0));
    assert_eq!(report.stop, StopReason::ChannelClosed { worker: 1, index: 1 });
    assert_eq!(report.next_index, 1);
    drop(tx0);
}

#[tokio::test]
async fn collector_stops_on_error_result() {
    let (tx0, rx0) = mpsc::channel(4);
    let (tx1, rx1) = mpsc::channel(4);
    tx0.send(FetchResult::success(0, Bytes::from(payload(0)))).await.unwrap();
    tx1.send(FetchResult::failure(1, FetchError::RetriesExhausted {
        attempts: 3,
        last: AttemptError::Status(500),
    }))
    .await
    .unwrap();
    tx0.send(FetchResult::success(2, Bytes::from(payload(2)))).await.unwrap();

    let mut sink = Vec::new();
    let report = OrderedCollector::new(&mut sink, StridePartition::new(0, 2))
        .run(vec![rx0, rx1], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, payload(0));
    assert!(matches!(report.stop, StopReason::FetchFailed { index: 1, .. }));
}

#[tokio::test]
async fn collector_rejects_out_of_order_result() {
    let (tx0, rx0) = mpsc::channel(4);
    tx0.send(FetchResult::success(0, Bytes::from(payload(0)))).await.unwrap();
    tx0.send(FetchResult::success(5, Bytes::from(payload(5)))).await.unwrap();

    let mut sink = Vec::new();
    let err = OrderedCollector::new(&mut sink, StridePartition::new(0, 1))
        .run(vec![rx0], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::OutOfOrder { expected: 1, got: 5 }));
    assert_eq!(sink, payload(0));
}

#[tokio::test]
async fn collector_honours_offset_start_index() {
    let (tx0, rx0) = mpsc::channel(4);
    let (tx1, rx1) = mpsc::channel(4);
    tx0.send(FetchResult::success(10, Bytes::from(payload(10)))).await.unwrap();
    tx1.send(FetchResult::success(11, Bytes::from(payload(11)))).await.unwrap();
    tx0.send(FetchResult::success(12, Bytes::from(payload(12)))).await.unwrap();
    drop(tx1);

    let mut sink = Vec::new();
    let report = OrderedCollector::new(&mut sink, StridePartition::new(10, 2))
        .run(vec![rx0, rx1], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sink, concat(10..13));
    assert_eq!(report.start_index, 10);
    assert_eq!(report.stop, StopReason::ChannelClosed { worker: 1, index: 13 });
    drop(tx0);
}

#[tokio::test]
async fn pool_reports_progress_per_segment() {
    let server = SegmentServer::new(5);
    let seen = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink_seen = Arc::clone(&seen);
    let config = config(2).on_progress(Arc::new(move |p: &Progress| {
        sink_seen.lock().unwrap().push(*p);
    }));
    let pool = SegmentPool::new(server, locator, config);
    let mut sink = Vec::new();

    pool.run_with_sink(&mut sink, &CancellationToken::new())
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let indices: Vec<u64> = seen.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(seen.last().unwrap().bytes_written, sink.len() as u64);
}

#[tokio::test]
async fn cancellation_ends_pool_run() {
    let server = SegmentServer::new(u64::MAX);
    let pool = SegmentPool::new(server, locator, config(3).interval_ms(5));
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut sink = Vec::new();
    let report = tokio::time::timeout(Duration::from_secs(5), pool.run_with_sink(&mut sink, &cancel))
        .await
        .expect("pool ignored cancellation")
        .unwrap();

    assert!(matches!(report.stop, StopReason::Cancelled { .. }));
    assert_eq!(sink, concat(0..report.next_index));
}

#[tokio::test]
async fn cancellation_ends_sequential_run() {
    let server = SegmentServer::new(u64::MAX);
    let fetch = SequentialFetch::new(server, locator, config(1));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut sink = Vec::new();
    let report = fetch.run_with_sink(&mut sink, &cancel).await.unwrap();

    assert_eq!(report.stop, StopReason::Cancelled { index: 0 });
    assert!(sink.is_empty());
}

#[tokio::test]
async fn rerun_appends_to_existing_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out").join("session.ts");

    for _ in 0..2 {
        let server = SegmentServer::new(2);
        let config = config(1);
        let config = StreamConfig { output: output.clone(), ..config };
        let report = SegmentPool::new(server, locator, config)
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.segments_written, 2);
    }

    let written = std::fs::read(&output).unwrap();
    let mut expected = concat(0..2);
    expected.extend(concat(0..2));
    assert_eq!(written, expected);
}

#[tokio::test]
async fn sequential_appends_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("session.ts");
    std::fs::write(&output, b"existing").unwrap();

    let server = SegmentServer::new(2);
    let config = StreamConfig { output: output.clone(), ..config(1) };
    SequentialFetch::new(server, locator, config)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let mut expected = b"existing".to_vec();
    expected.extend(concat(0..2));
    assert_eq!(std::fs::read(&output).unwrap(), expected);
}

/// Accepts `budget` bytes, then fails every write.
struct FailingSink {
    budget: usize,
}

impl AsyncWrite for FailingSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.budget == 0 {
            return Poll::Ready(Err(io::Error::other("disk full")));
        }
        let n = buf.len().min(self.budget);
        self.budget -= n;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn sink_write_failure_is_fatal() {
    let server = SegmentServer::new(10);
    let pool = SegmentPool::new(server, locator, config(2));
    let sink = FailingSink {
        budget: payload(0).len() + 3,
    };

    let err = pool
        .run_with_sink(sink, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Write { index: 1, .. }));
}

#[tokio::test]
async fn zero_workers_rejected() {
    let server = SegmentServer::new(1);
    let pool = SegmentPool::new(server, locator, config(0));
    let err = pool
        .run_with_sink(Vec::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidConfig(_)));
}
