//! Trusted IP ranges: HTTP source, flattening, and CIDR membership.

mod classify;
mod fetch;
#[cfg(feature = "test-util")]
pub mod mock;

pub use classify::{classify, is_trusted, parse_network};
pub use fetch::{flatten_ranges, HttpRangeSource, DEFAULT_RANGES_URL};
pub use grp_types::{IpClass, RangeFetchError, RangeSource};

#[cfg(feature = "test-util")]
pub use mock::{FailingRangeSource, StaticRangeSource};
