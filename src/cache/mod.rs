//! Cache module for holding API responses in memory
//!
//! This module provides a time-bounded cache keyed by request URL. Entries are
//! raw response bodies; decoding happens in the API client, never here. Expired
//! entries are reclaimed by a background sweep rather than checked on read.

mod ttl;

pub use ttl::{CacheError, TtlCache};
