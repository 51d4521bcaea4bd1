//! Addressing of stream segments.
//!
//! A recording session is identified by three path hashes and two query
//! identifiers taken from one captured segment URL. From those, every
//! segment index resolves to its own URL with a fresh timestamp.
//!
//! ```
//! use segstream_locator::{Endpoint, QueryParams, StreamLocator, StreamTarget};
//! use segstream_fetch::SegmentLocator;
//!
//! let target = StreamTarget::parse(
//!     "https://streaming.disk.yandex.net/hls/u1/p1/v1/720p/0.ts?vsid=abcxWEBx2402x1&vpuid=42",
//! )?;
//! let query = QueryParams::new(&target.vsid, "", "", &target.vpuid, 1_700_000_000, 0);
//! let locator = StreamLocator::new(Endpoint::default(), target, query);
//!
//! let request = locator.locate(7);
//! assert!(request.url.starts_with("https://streaming.disk.yandex.net/hls/u1/p1/v1/720p/7.ts?"));
//! # Ok::<(), segstream_locator::LocatorError>(())
//! ```

mod error;
mod locator;
mod query;
mod target;

pub use error::LocatorError;
pub use locator::{Endpoint, StreamLocator, segment_url};
pub use query::QueryParams;
pub use target::StreamTarget;
