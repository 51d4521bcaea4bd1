use crate::data::SegmentRequest;

/// Resolves the fetchable URL of a segment index.
///
/// Called once per fetch cycle. Implementations should treat their
/// parameters as an immutable template and return an independently owned
/// request each time (fresh timestamps included).
pub trait SegmentLocator: Send + Sync {
    fn locate(&self, index: u64) -> SegmentRequest;
}

impl<F> SegmentLocator for F
where
    F: Fn(u64) -> String + Send + Sync,
{
    fn locate(&self, index: u64) -> SegmentRequest {
        SegmentRequest::new(index, self(index))
    }
}
