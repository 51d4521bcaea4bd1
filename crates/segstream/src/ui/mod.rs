mod tracker;

pub use tracker::{SegmentTracker, SegmentTrackerBuilder, Tracker, TrackerBuilder};
