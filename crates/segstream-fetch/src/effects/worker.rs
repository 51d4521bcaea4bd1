use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{StridePartition, jitter_delay};
use crate::data::FetchResult;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::effects::locator::SegmentLocator;
use crate::effects::sleep_or_cancel;
use crate::error::FetchError;

/// One producer of the pool: fetches its residue class of indices in order.
pub(crate) struct Worker<C: HttpClient, L: SegmentLocator> {
    pub(crate) id: usize,
    pub(crate) fetcher: Arc<Fetcher<C>>,
    pub(crate) locator: Arc<L>,
    pub(crate) partition: StridePartition,
    pub(crate) interval_ms: u64,
}

impl<C: HttpClient, L: SegmentLocator> Worker<C, L> {
    /// Runs until the first terminal fetch error, cancellation, or the
    /// collector dropping its receiver. The channel closes when `tx` drops.
    pub(crate) async fn run(self, tx: mpsc::Sender<FetchResult>, cancel: CancellationToken) {
        let mut index = self.partition.first_index(self.id);

        while !cancel.is_cancelled() {
            let request = self.locator.locate(index);
            debug!(worker = self.id, index, url = %request.url, "fetching segment");

            match self.fetcher.fetch(&request, &cancel).await {
                Ok(payload) => {
                    if tx.send(FetchResult::success(index, payload)).await.is_err() {
                        debug!(worker = self.id, index, "collector gone, stopping");
                        return;
                    }
                    debug!(worker = self.id, index, "segment queued");
                    index = self.partition.next_index(index);

                    let delay = jitter_delay(self.interval_ms, &mut rand::thread_rng());
                    if !sleep_or_cancel(delay, &cancel).await {
                        break;
                    }
                }
                Err(FetchError::Cancelled) => break,
                Err(error) => {
                    warn!(worker = self.id, index, %error, "stopping worker after terminal error");
                    let _ = tx.send(FetchResult::failure(index, error)).await;
                    return;
                }
            }
        }

        info!(worker = self.id, index, "worker cancelled");
    }
}
