use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::StridePartition;
use crate::data::{StreamConfig, StreamReport};
use crate::effects::collector::OrderedCollector;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::effects::locator::SegmentLocator;
use crate::effects::open_append;
use crate::effects::worker::Worker;
use crate::error::{Result, StreamError};

/// N concurrent workers feeding one ordered collector.
///
/// Worker `w` fetches `start + w + k*N` and pushes results onto its own
/// bounded channel; a full channel blocks the worker until the collector
/// catches up. When the collector stops, the remaining workers are
/// cancelled and joined before the run returns.
pub struct SegmentPool<C: HttpClient, L: SegmentLocator> {
    fetcher: Arc<Fetcher<C>>,
    locator: Arc<L>,
    config: StreamConfig,
}

impl<C, L> SegmentPool<C, L>
where
    C: HttpClient + 'static,
    L: SegmentLocator + 'static,
{
    pub fn new(client: C, locator: L, config: StreamConfig) -> Self {
        Self {
            fetcher: Arc::new(Fetcher::new(client, &config)),
            locator: Arc::new(locator),
            config,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Append to the configured output file until a stop condition.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<StreamReport> {
        self.config.validate()?;
        let started = Instant::now();
        let file = open_append(&self.config.output).await?;
        info!(
            output = %self.config.output.display(),
            workers = self.config.workers,
            "starting parallel download"
        );

        let mut report = self.stream(file, cancel).await?;
        report.elapsed = started.elapsed();
        info!(elapsed = ?report.elapsed, bytes = report.bytes_written, "time elapsed");
        Ok(report)
    }

    /// Stream into an arbitrary sink.
    pub async fn run_with_sink<W: AsyncWrite + Unpin>(
        &self,
        sink: W,
        cancel: &CancellationToken,
    ) -> Result<StreamReport> {
        self.config.validate()?;
        self.stream(sink, cancel).await
    }

    async fn stream<W: AsyncWrite + Unpin>(
        &self,
        sink: W,
        cancel: &CancellationToken,
    ) -> Result<StreamReport> {
        let partition = StridePartition::new(self.config.start_index, self.config.workers);
        let workers_token = cancel.child_token();

        let mut receivers = Vec::with_capacity(partition.workers());
        let mut tasks = JoinSet::new();
        for id in 0..partition.workers() {
            let (tx, rx) = mpsc::channel(self.config.channel_capacity);
            receivers.push(rx);

            let worker = Worker {
                id,
                fetcher: Arc::clone(&self.fetcher),
                locator: Arc::clone(&self.locator),
                partition,
                interval_ms: self.config.interval_ms,
            };
            tasks.spawn(worker.run(tx, workers_token.clone()));
        }

        let outcome = OrderedCollector::new(sink, partition)
            .with_config(&self.config)
            .run(receivers, &workers_token)
            .await;

        workers_token.cancel();
        let mut join_error = None;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker task failed");
                join_error.get_or_insert(StreamError::Join(e.to_string()));
            }
        }

        let report = outcome?;
        match join_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
