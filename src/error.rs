//! Crate-wide error taxonomy (§7).
//!
//! Transient network/throttling failures are recovered locally by the fetch
//! client and never reach these types. `ScrapeError` is what crosses
//! component boundaries: parser misses, configuration errors, and the
//! cooperative `SessionLimitReached` condition, which the orchestrator
//! matches explicitly and never treats as a failure.

use thiserror::Error;

/// Errors raised by the Fetch Client (§4.D).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("exhausted {attempts} retries for {url}, last status {status}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: u16,
    },
    #[error("session limit reached while fetching {url}")]
    SessionLimit { url: String },
    #[error("proxy {proxy} could not be used: {source}")]
    Proxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors raised by a parser (§4.F/G/H) for a single record.
///
/// Parser misses are not propagated as hard failures; callers log and skip.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("required field missing: {0}")]
    MissingField(&'static str),
    #[error("page structure not recognized")]
    UnrecognizedStructure,
}

/// The cooperative, non-error termination condition of the Rate Governor (§4.B, §7).
///
/// Carried as its own type (rather than a bare signal) so callers cannot
/// accidentally match it as a failure path.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimitReached;

impl std::fmt::Display for SessionLimitReached {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stealth session limit reached")
    }
}

impl std::error::Error for SessionLimitReached {}

/// Pipeline-wide error type, composed at the Orchestrator/CLI boundary.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no leads found for this search")]
    NoLeads,

    #[error("session limit reached")]
    SessionLimit(#[from] SessionLimitReached),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
