use std::path::Path;
use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::jitter_delay;
use crate::data::{Progress, StopReason, StreamConfig, StreamReport};
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::effects::locator::SegmentLocator;
use crate::effects::{open_append, sleep_or_cancel};
use crate::error::{FetchError, Result, StreamError};

/// Single-producer fallback: fetch, write, sleep, repeat.
///
/// Same retry contract and termination rules as the pool, without the
/// channel indirection.
pub struct SequentialFetch<C: HttpClient, L: SegmentLocator> {
    fetcher: Fetcher<C>,
    locator: L,
    config: StreamConfig,
}

impl<C: HttpClient, L: SegmentLocator> SequentialFetch<C, L> {
    pub fn new(client: C, locator: L, config: StreamConfig) -> Self {
        Self {
            fetcher: Fetcher::new(client, &config),
            locator,
            config,
        }
    }

    /// Append to the configured output file until a stop condition.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<StreamReport> {
        self.config.validate()?;
        let started = Instant::now();
        let mut file = open_append(&self.config.output).await?;
        info!(output = %self.config.output.display(), "starting sequential download");

        let mut report = self.run_with_sink(&mut file, cancel).await?;
        report.elapsed = started.elapsed();
        log_output_size(&self.config.output).await;
        Ok(report)
    }

    /// Stream into an arbitrary sink.
    pub async fn run_with_sink<W: AsyncWrite + Unpin>(
        &self,
        sink: &mut W,
        cancel: &CancellationToken,
    ) -> Result<StreamReport> {
        let started = Instant::now();
        let mut index = self.config.start_index;
        let mut segments_written = 0u64;
        let mut bytes_written = 0u64;

        let stop = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled { index };
            }

            let request = self.locator.locate(index);
            info!(index, url = %request.url, "downloading");

            let payload = match self.fetcher.fetch(&request, cancel).await {
                Ok(payload) => payload,
                Err(FetchError::Cancelled) => break StopReason::Cancelled { index },
                Err(error) => {
                    warn!(index, %error, "download failed");
                    break StopReason::FetchFailed { index, error };
                }
            };

            let write = async {
                sink.write_all(&payload).await?;
                sink.flush().await
            };
            write
                .await
                .map_err(|source| StreamError::Write { index, source })?;

            segments_written += 1;
            bytes_written += payload.len() as u64;
            let progress = Progress {
                index,
                segment_bytes: payload.len() as u64,
                segments_written,
                bytes_written,
            };
            info!(
                index,
                total_mb = progress.megabytes_written(),
                "downloaded segment"
            );
            self.config.report_progress(progress);
            index += 1;

            let delay = jitter_delay(self.config.interval_ms, &mut rand::thread_rng());
            if !sleep_or_cancel(delay, cancel).await {
                break StopReason::Cancelled { index };
            }
        };

        Ok(StreamReport {
            start_index: self.config.start_index,
            next_index: index,
            segments_written,
            bytes_written,
            elapsed: started.elapsed(),
            stop,
        })
    }
}

async fn log_output_size(path: &Path) {
    if let Ok(meta) = tokio::fs::metadata(path).await {
        info!(
            size_mb = meta.len() as f64 / 1024.0 / 1024.0,
            "current output file size"
        );
    }
}
