use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use segstream_fetch::{
    CancellationToken, Progress, ReqwestClient, SegmentPool, SequentialFetch, StreamConfig,
    StreamReport,
};
use segstream_locator::StreamLocator;
use tracing::{info, warn};

use crate::cli::locate::build_locator;
use crate::config::Settings;
use crate::ui::{SegmentTracker, SegmentTrackerBuilder, Tracker, TrackerBuilder};

#[derive(Args, Clone, Debug, Default)]
pub struct FetchArg {
    #[arg(long, help = "Fetch one segment at a time instead of using workers")]
    pub sequential: bool,

    #[arg(long, help = "Exit with an error when a segment exhausts its retries")]
    pub strict: bool,

    #[arg(long, help = "Do not draw the progress spinner")]
    pub no_progress: bool,
}

impl FetchArg {
    pub fn run(self, settings: Settings) -> Result<()> {
        let locator = build_locator(&settings)?;

        let tracker = SegmentTrackerBuilder::default()
            .with_prefix("Recording")
            .with_finish("stopped")
            .hidden(self.no_progress)
            .build();

        let config = if self.sequential {
            settings.sequential_config()
        } else {
            settings.stream_config()
        };
        let config = attach_tracker(config, &tracker);

        let client =
            ReqwestClient::with_timeout(config.timeout).context("Failed to build HTTP client")?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        info!(
            output = %config.output.display(),
            workers = config.workers,
            start_index = config.start_index,
            "recording stream"
        );

        let report = runtime.block_on(self.record(client, locator, config))?;
        tracker.finish();
        log_report(&report);

        if self.strict {
            report.ensure_complete()?;
        }
        Ok(())
    }

    async fn record(
        &self,
        client: ReqwestClient,
        locator: StreamLocator,
        config: StreamConfig,
    ) -> segstream_fetch::Result<StreamReport> {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing current segment");
                interrupt.cancel();
            }
        });

        if self.sequential {
            SequentialFetch::new(client, locator, config).run(&cancel).await
        } else {
            SegmentPool::new(client, locator, config).run(&cancel).await
        }
    }
}

fn attach_tracker(config: StreamConfig, tracker: &SegmentTracker) -> StreamConfig {
    let tracker = tracker.clone();
    config.on_progress(Arc::new(move |progress: &Progress| {
        tracker.step(progress);
    }))
}

fn log_report(report: &StreamReport) {
    info!(
        segments = report.segments_written,
        bytes = report.bytes_written,
        megabytes = report.megabytes_written(),
        elapsed_secs = report.elapsed.as_secs_f64(),
        next_index = report.next_index,
        "stream stopped: {}",
        report.stop
    );
}
