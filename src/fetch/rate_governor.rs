//! Rate Governor (§4.B): blocking per-domain pacing with exponential backoff
//! and periodic long pauses, grounded on the original `rate_limiter.py`.
//!
//! Reconciled with the teacher's lock-free token-bucket limiter per
//! SPEC_FULL §9a: kept the per-domain DashMap-of-state shape, but each entry
//! is a `Mutex`-guarded struct and `acquire` sleeps, mirroring the Python
//! original's blocking `RateLimiter.wait()` rather than the teacher's
//! non-blocking `Allow`/`Deny` design.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::Rng;
use tokio::time::sleep;

use crate::config::{RateLimitConfig, StealthConfig};
use crate::error::SessionLimitReached;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    Directory,
    Map,
    External,
}

struct DomainState {
    request_count: u64,
    last_request_at: Option<Instant>,
    consecutive_errors: u32,
    blocked_until: Option<Instant>,
}

impl Default for DomainState {
    fn default() -> Self {
        Self { request_count: 0, last_request_at: None, consecutive_errors: 0, blocked_until: None }
    }
}

struct StealthTracker {
    session_start: Instant,
    hour_window_start: Mutex<Instant>,
    requests_this_hour: AtomicU64,
    requests_since_break: AtomicU32,
}

/// Blocking, domain-aware rate governor (§4.B). Cheap to clone — internal
/// state is reference-counted.
pub struct RateGovernor {
    config: RateLimitConfig,
    stealth: Option<StealthConfig>,
    domains: DashMap<String, Mutex<DomainState>>,
    global_request_count: AtomicU64,
    stealth_tracker: Option<StealthTracker>,
}

impl RateGovernor {
    #[must_use]
    pub fn new(config: RateLimitConfig, stealth: Option<StealthConfig>) -> Self {
        let stealth_tracker = stealth.as_ref().map(|_| StealthTracker {
            session_start: Instant::now(),
            hour_window_start: Mutex::new(Instant::now()),
            requests_this_hour: AtomicU64::new(0),
            requests_since_break: AtomicU32::new(0),
        });
        Self {
            config,
            stealth,
            domains: DashMap::new(),
            global_request_count: AtomicU64::new(0),
            stealth_tracker,
        }
    }

    fn classify(&self, domain: &str, kind: DomainKind) -> DomainKind {
        let _ = domain;
        kind
    }

    fn base_delay(&self, kind: DomainKind) -> (f64, f64) {
        match kind {
            DomainKind::Directory => (self.config.directory_min_delay, self.config.directory_max_delay),
            DomainKind::Map => (self.config.map_min_delay, self.config.map_max_delay),
            DomainKind::External => (self.config.external_min_delay, self.config.external_max_delay),
        }
    }

    /// Blocks (cooperatively, via `tokio::time::sleep`) until the governor
    /// judges it safe to issue the next request to `domain`. Returns an error
    /// only when stealth session limits have been exceeded (§4.B, §7).
    pub async fn acquire(&self, domain: &str, kind: DomainKind) -> Result<(), SessionLimitReached> {
        self.check_stealth_limits()?;

        let kind = self.classify(domain, kind);
        let entry = self.domains.entry(domain.to_string()).or_default();
        let wait_for;
        {
            let mut state = entry.lock();

            if let Some(blocked_until) = state.blocked_until {
                if Instant::now() < blocked_until {
                    let extra = blocked_until - Instant::now();
                    state.blocked_until = None;
                    drop(state);
                    sleep(extra).await;
                    state = entry.lock();
                } else {
                    state.blocked_until = None;
                }
            }

            let (min_delay, max_delay) = self.base_delay(kind);
            let mut delay = rand::rng().random_range(min_delay..=max_delay);
            if state.consecutive_errors > 0 {
                let backoff = self.config.backoff_factor.powi(state.consecutive_errors as i32);
                delay = (delay * backoff).min(60.0);
            }

            let since_last = state.last_request_at.map_or(delay, |t| t.elapsed().as_secs_f64());
            let mut actual_delay = (delay - since_last).max(0.0);

            if kind == DomainKind::Directory
                && state.request_count > 0
                && state.request_count % u64::from(self.config.directory_pause_every_n_requests) == 0
            {
                let pause = rand::rng().random_range(
                    self.config.directory_pause_min_duration..=self.config.directory_pause_max_duration,
                );
                actual_delay += pause;
            }

            state.request_count += 1;
            state.last_request_at = Some(Instant::now());
            wait_for = actual_delay;
        }

        self.global_request_count.fetch_add(1, Ordering::SeqCst);
        if let Some(tracker) = &self.stealth_tracker {
            tracker.requests_this_hour.fetch_add(1, Ordering::SeqCst);
            tracker.requests_since_break.fetch_add(1, Ordering::SeqCst);
        }

        if wait_for > 0.0 {
            sleep(Duration::from_secs_f64(wait_for)).await;
        }
        Ok(())
    }

    fn check_stealth_limits(&self) -> Result<(), SessionLimitReached> {
        let (Some(stealth), Some(tracker)) = (&self.stealth, &self.stealth_tracker) else {
            return Ok(());
        };
        if !stealth.enabled {
            return Ok(());
        }

        let session_elapsed = tracker.session_start.elapsed();
        if session_elapsed >= Duration::from_secs(u64::from(stealth.max_session_duration_minutes) * 60) {
            return Err(SessionLimitReached);
        }

        let mut window_start = tracker.hour_window_start.lock();
        if window_start.elapsed() >= Duration::from_secs(3600) {
            *window_start = Instant::now();
            tracker.requests_this_hour.store(0, Ordering::SeqCst);
        }
        if tracker.requests_this_hour.load(Ordering::SeqCst) >= u64::from(stealth.max_requests_per_hour) {
            return Err(SessionLimitReached);
        }

        Ok(())
    }

    /// Non-blocking peek at whether the stealth session/hour ceiling has
    /// already been reached, so a multi-call stage (e.g. the classifier
    /// running over many leads) can stop early rather than let every
    /// remaining `acquire` fail one at a time (§4.O, §7).
    #[must_use]
    pub fn session_limit_reached(&self) -> bool {
        self.check_stealth_limits().is_err()
    }

    /// An extended pause the stealth cadence schedules every
    /// `requests_before_break` requests; callers should `.await` this
    /// alongside `acquire` (§4.B stealth mode).
    pub async fn maybe_take_stealth_break(&self) {
        let Some(stealth) = &self.stealth else { return };
        let Some(tracker) = &self.stealth_tracker else { return };
        if !stealth.enabled {
            return;
        }
        let count = tracker.requests_since_break.load(Ordering::SeqCst);
        if count > 0 && count % stealth.requests_before_break == 0 {
            let duration = rand::rng().random_range(stealth.break_min_duration..=stealth.break_max_duration);
            tracker.requests_since_break.store(0, Ordering::SeqCst);
            sleep(Duration::from_secs_f64(duration)).await;
        }
    }

    pub fn report_success(&self, domain: &str) {
        if let Some(entry) = self.domains.get(domain) {
            entry.lock().consecutive_errors = 0;
        }
    }

    pub fn report_error(&self, domain: &str, status_code: u16) {
        let entry = self.domains.entry(domain.to_string()).or_default();
        let mut state = entry.lock();
        state.consecutive_errors += 1;
        if self.config.retry_status_codes.contains(&status_code) {
            let block_duration = (self.config.backoff_factor.powi(state.consecutive_errors as i32) * 5.0).min(300.0);
            state.blocked_until = Some(Instant::now() + Duration::from_secs_f64(block_duration));
        }
    }

    #[must_use]
    pub fn should_retry(&self, status_code: u16, attempt: u32) -> bool {
        attempt < self.config.max_retries && self.config.retry_status_codes.contains(&status_code)
    }

    /// Whether a transient network error (timeout, connection reset, DNS)
    /// should be retried, per the same `max_retries` ceiling as HTTP-status
    /// retries (§7: "retried by Fetch Client up to max_retries").
    #[must_use]
    pub fn should_retry_network_error(&self, attempt: u32) -> bool {
        attempt < self.config.max_retries
    }

    #[must_use]
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = 2.0_f64;
        let delay = base * self.config.backoff_factor.powi(attempt as i32);
        let jitter = delay * 0.2 * rand::rng().random_range(-1.0..=1.0);
        Duration::from_secs_f64((delay + jitter).max(0.0))
    }

    #[must_use]
    pub fn global_request_count(&self) -> u64 {
        self.global_request_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_succeeds_without_stealth() {
        let governor = RateGovernor::new(RateLimitConfig::default(), None);
        governor.acquire("example.test", DomainKind::External).await.unwrap();
        assert_eq!(governor.global_request_count(), 1);
    }

    #[test]
    fn should_retry_respects_max_attempts() {
        let governor = RateGovernor::new(RateLimitConfig::default(), None);
        assert!(governor.should_retry(429, 0));
        assert!(!governor.should_retry(429, 3));
        assert!(!governor.should_retry(404, 0));
    }

    #[test]
    fn should_retry_network_error_respects_configured_max_retries() {
        let config = RateLimitConfig { max_retries: 2, ..RateLimitConfig::default() };
        let governor = RateGovernor::new(config, None);
        assert!(governor.should_retry_network_error(0));
        assert!(governor.should_retry_network_error(1));
        assert!(!governor.should_retry_network_error(2));
    }
}
