/// Round-robin split of the index space `start..` across `workers` producers.
///
/// Worker `w` owns `start + w, start + w + N, start + w + 2N, ...`. The
/// collector uses [`owner`](Self::owner) to find the queue that must hold the
/// next expected index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridePartition {
    start: u64,
    workers: usize,
}

impl StridePartition {
    /// `workers` must be non-zero; [`StreamConfig::validate`](crate::StreamConfig::validate)
    /// guarantees it for configured runs.
    pub fn new(start: u64, workers: usize) -> Self {
        debug_assert!(workers > 0, "partition needs at least one worker");
        Self { start, workers }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stride(&self) -> u64 {
        self.workers as u64
    }

    pub fn first_index(&self, worker: usize) -> u64 {
        self.start + worker as u64
    }

    pub fn next_index(&self, index: u64) -> u64 {
        index + self.stride()
    }

    /// Worker owning `index`, or `None` below the start of the partition.
    pub fn owner(&self, index: u64) -> Option<usize> {
        let offset = index.checked_sub(self.start)?;
        Some((offset % self.stride()) as usize)
    }

    pub fn indices(&self, worker: usize) -> impl Iterator<Item = u64> + use<> {
        let stride = self.stride();
        let mut next = self.first_index(worker);
        std::iter::from_fn(move || {
            let current = next;
            next += stride;
            Some(current)
        })
    }
}
