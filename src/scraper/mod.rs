//! Web scraper for fbref.com
//!
//! Fetching, table location, numeric coercion and the entity and match
//! report parsers.

pub mod client;
pub mod match_stats;
pub mod numeric;
pub mod parsers;
pub mod rate_limiter;
pub mod table;

pub use client::{Fetch, HttpFetcher};
pub use rate_limiter::RateLimiter;
