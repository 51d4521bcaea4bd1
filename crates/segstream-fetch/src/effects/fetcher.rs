use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::retry_delay;
use crate::data::{RetryPolicy, SegmentRequest, StreamConfig};
use crate::effects::http::HttpClient;
use crate::effects::sleep_or_cancel;
use crate::error::{AttemptError, FetchError};

/// Downloads one segment with a bounded number of attempts.
///
/// Each attempt is a GET carrying the configured headers, bounded by the
/// per-request timeout. Request construction failures, transport failures and
/// any status other than 200 consume one attempt. After the last failed
/// attempt the fetch fails with [`FetchError::RetriesExhausted`].
pub struct Fetcher<C: HttpClient> {
    client: C,
    headers: Arc<[(String, String)]>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, config: &StreamConfig) -> Self {
        Self {
            client,
            headers: Arc::clone(&config.headers),
            timeout: config.timeout,
            retry: config.retry,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch the segment, returning its complete body.
    ///
    /// Cancellation is observed while a request is in flight and during the
    /// sleep between attempts; it is never retried.
    pub async fn fetch(
        &self,
        request: &SegmentRequest,
        cancel: &CancellationToken,
    ) -> Result<Bytes, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                outcome = self.attempt(&request.url) => outcome,
            };

            match outcome {
                Ok(body) => {
                    info!(
                        url = %request.url,
                        index = request.index,
                        attempt,
                        bytes = body.len(),
                        "segment downloaded"
                    );
                    return Ok(body);
                }
                Err(error) => {
                    warn!(
                        url = %request.url,
                        index = request.index,
                        attempt,
                        %error,
                        "attempt failed"
                    );
                    if attempt >= max_attempts {
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            last: error,
                        });
                    }
                }
            }

            let delay = retry_delay(attempt, &self.retry);
            debug!(index = request.index, ?delay, "retrying");
            if !sleep_or_cancel(delay, cancel).await {
                return Err(FetchError::Cancelled);
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, url: &str) -> Result<Bytes, AttemptError> {
        let url = Url::parse(url).map_err(|e| AttemptError::InvalidRequest {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = tokio::time::timeout(self.timeout, self.client.get(&url, &self.headers))
            .await
            .map_err(|_| AttemptError::Timeout(self.timeout))?
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if !response.is_ok() {
            return Err(AttemptError::Status(response.status));
        }
        Ok(response.body)
    }
}
