//! Rate-limited media transfer.
//!
//! Provides the `Transfer` trait used by the downloader and an HTTP
//! implementation throttled by a byte-rate token bucket.

mod http;
mod rate_limiter;
mod types;

pub use http::HttpTransfer;
pub use rate_limiter::ByteRateLimiter;
pub use types::{Transfer, TransferError};
