/// Snapshot emitted after a segment reached the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Index of the segment just written.
    pub index: u64,
    pub segment_bytes: u64,
    pub segments_written: u64,
    pub bytes_written: u64,
}

impl Progress {
    pub fn megabytes_written(&self) -> f64 {
        self.bytes_written as f64 / 1024.0 / 1024.0
    }
}
