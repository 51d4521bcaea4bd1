//! Pure transformations used by the fetch engine.
//!
//! Nothing here touches the network, the clock or the sink; the effect
//! layer feeds these functions and acts on their results.

mod jitter;
mod partition;
mod retry;

pub use jitter::jitter_delay;
pub use partition::StridePartition;
pub use retry::retry_delay;
