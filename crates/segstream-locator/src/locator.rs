use std::sync::atomic::{AtomicI64, Ordering};

use segstream_fetch::{SegmentLocator, SegmentRequest};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::query::QueryParams;
use crate::target::StreamTarget;

/// Fixed parts of a segment URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub protocol: String,
    pub domain: String,
    pub tag: String,
    pub quality: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            protocol: "https".into(),
            domain: "streaming.disk.yandex.net".into(),
            tag: "hls".into(),
            quality: "720p".into(),
        }
    }
}

/// `{protocol}://{domain}/{tag}/{user}/{playlist}/{video}/{quality}/{index}.ts?{query}`
pub fn segment_url(
    endpoint: &Endpoint,
    target: &StreamTarget,
    index: u64,
    query: &QueryParams,
) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.pairs())
        .finish();

    format!(
        "{}://{}/{}/{}/{}/{}/{}/{}.ts?{}",
        endpoint.protocol,
        endpoint.domain,
        endpoint.tag,
        target.user_hash,
        target.playlist_hash,
        target.video_hash,
        endpoint.quality,
        index,
        query
    )
}

/// Resolves segment indices of one session, stamping each call with a
/// strictly increasing millisecond timestamp.
#[derive(Debug)]
pub struct StreamLocator {
    endpoint: Endpoint,
    target: StreamTarget,
    template: QueryParams,
    last_stamp: AtomicI64,
    clock: fn() -> i64,
}

impl StreamLocator {
    pub fn new(endpoint: Endpoint, target: StreamTarget, template: QueryParams) -> Self {
        Self::with_clock(endpoint, target, template, now_ms)
    }

    pub fn with_clock(
        endpoint: Endpoint,
        target: StreamTarget,
        template: QueryParams,
        clock: fn() -> i64,
    ) -> Self {
        Self {
            endpoint,
            target,
            template,
            last_stamp: AtomicI64::new(i64::MIN),
            clock,
        }
    }

    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    pub fn template(&self) -> &QueryParams {
        &self.template
    }

    /// Clock reading, bumped past the previous stamp when the clock stalls.
    fn fresh_stamp(&self) -> i64 {
        let now = (self.clock)();
        let prev = self
            .last_stamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or(now);
        now.max(prev.saturating_add(1))
    }

    pub fn resolve(&self, index: u64) -> String {
        let query = self.template.stamped(self.fresh_stamp());
        segment_url(&self.endpoint, &self.target, index, &query)
    }
}

impl SegmentLocator for StreamLocator {
    fn locate(&self, index: u64) -> SegmentRequest {
        SegmentRequest::new(index, self.resolve(index))
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
