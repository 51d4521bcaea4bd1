//! I/O operations of the fetch engine.
//!
//! Network requests go through the [`HttpClient`] trait, URL construction
//! through [`SegmentLocator`]; both are seams for tests and for callers
//! with their own transport or addressing scheme.

mod collector;
mod fetcher;
mod http;
mod locator;
mod pool;
mod sequential;
mod worker;

pub use collector::OrderedCollector;
pub use fetcher::Fetcher;
pub use http::{HttpClient, HttpResponse};
pub use locator::SegmentLocator;
pub use pool::SegmentPool;
pub use sequential::SequentialFetch;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

use std::path::Path;

use tokio::fs::{File, OpenOptions};

use crate::error::{Result, StreamError};

/// Opens the output sink for appending, creating it when missing.
///
/// Existing content is kept: running twice against the same path yields the
/// concatenation of both runs.
pub(crate) async fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StreamError::OpenOutput {
                path: path.to_path_buf(),
                source,
            })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| StreamError::OpenOutput {
            path: path.to_path_buf(),
            source,
        })
}

/// Sleeps for `duration` unless `cancel` fires first. Returns `false` on cancellation.
pub(crate) async fn sleep_or_cancel(
    duration: std::time::Duration,
    cancel: &tokio_util::sync::CancellationToken,
) -> bool {
    if duration.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
