use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::StridePartition;
use crate::data::{FetchResult, Progress, StopReason, StreamConfig, StreamReport};
use crate::error::{Result, StreamError};

/// Merges per-worker ordered queues into one ascending byte stream.
///
/// The collector is the only writer of the sink. It reads the queue of the
/// worker owning the next expected index and nothing else, so a gap at the
/// expected position ends the stream even if later segments are buffered.
pub struct OrderedCollector<'a, W> {
    sink: W,
    partition: StridePartition,
    config: Option<&'a StreamConfig>,
    expected: u64,
    segments_written: u64,
    bytes_written: u64,
}

impl<'a, W: AsyncWrite + Unpin> OrderedCollector<'a, W> {
    pub fn new(sink: W, partition: StridePartition) -> Self {
        Self {
            sink,
            partition,
            config: None,
            expected: partition.start(),
            segments_written: 0,
            bytes_written: 0,
        }
    }

    /// Report progress through the config's callback.
    #[must_use]
    pub fn with_config(mut self, config: &'a StreamConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Drain `channels` (indexed by worker id) until a stop condition.
    ///
    /// Fetch failures, closed channels and cancellation end the run with a
    /// [`StreamReport`]. An index mismatch or a failed write is fatal.
    pub async fn run(
        mut self,
        mut channels: Vec<mpsc::Receiver<FetchResult>>,
        cancel: &CancellationToken,
    ) -> Result<StreamReport> {
        let started = Instant::now();
        if channels.len() != self.partition.workers() {
            return Err(StreamError::InvalidConfig(format!(
                "collector expects {} channels, got {}",
                self.partition.workers(),
                channels.len()
            )));
        }

        let stop = loop {
            let worker = self.owner_of_expected();
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                received = channels[worker].recv() => Some(received),
            };

            let result = match received {
                None => {
                    info!(index = self.expected, "collector cancelled");
                    break StopReason::Cancelled { index: self.expected };
                }
                Some(None) => {
                    warn!(
                        worker,
                        index = self.expected,
                        "worker channel closed, stopping collector at expected index"
                    );
                    break StopReason::ChannelClosed {
                        worker,
                        index: self.expected,
                    };
                }
                Some(Some(result)) => result,
            };

            if result.index != self.expected {
                warn!(expected = self.expected, got = result.index, "out of order result");
                return Err(StreamError::OutOfOrder {
                    expected: self.expected,
                    got: result.index,
                });
            }

            match result.outcome {
                Ok(payload) => self.write(&payload).await?,
                Err(error) => {
                    warn!(index = self.expected, %error, "segment failed, ending file write");
                    break StopReason::FetchFailed {
                        index: self.expected,
                        error,
                    };
                }
            }
        };

        let discarded: usize = channels.iter().map(|rx| rx.len()).sum();
        if discarded > 0 {
            debug!(discarded, "dropping buffered results past the stop point");
        }
        drop(channels);

        if let Err(source) = self.sink.flush().await {
            return Err(StreamError::Write {
                index: self.expected,
                source,
            });
        }

        Ok(StreamReport {
            start_index: self.partition.start(),
            next_index: self.expected,
            segments_written: self.segments_written,
            bytes_written: self.bytes_written,
            elapsed: started.elapsed(),
            stop,
        })
    }

    fn owner_of_expected(&self) -> usize {
        // `expected` never drops below the partition start.
        self.partition.owner(self.expected).unwrap_or_default()
    }

    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        let index = self.expected;
        let write = async {
            self.sink.write_all(payload).await?;
            self.sink.flush().await
        };
        write
            .await
            .map_err(|source| StreamError::Write { index, source })?;

        self.segments_written += 1;
        self.bytes_written += payload.len() as u64;
        info!(index, bytes = payload.len(), "wrote chunk to output");

        if let Some(config) = self.config {
            config.report_progress(Progress {
                index,
                segment_bytes: payload.len() as u64,
                segments_written: self.segments_written,
                bytes_written: self.bytes_written,
            });
        }

        self.expected += 1;
        Ok(())
    }
}
