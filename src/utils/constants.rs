//! Shared configuration constants.
//!
//! Default values used throughout the crate to keep magic numbers in one place.

/// Chrome user agent string used as a stealth-mode fallback identity.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Default connect timeout for the fetch client, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout for the fetch client, in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Default maximum retries per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff multiplier applied per consecutive error.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// HTTP status codes considered retryable / indicative of throttling.
pub const RETRY_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

/// Description field truncation length, per §4.G.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Number of errors retained in `RunResult.errors`.
pub const MAX_RUN_ERRORS: usize = 10;
