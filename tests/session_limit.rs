//! Integration coverage for the cooperative stealth session-cap termination
//! (§8 scenario 5): `RateGovernor::acquire` must hand back `SessionLimitReached`
//! as data rather than panic or hang once the wall-clock cap is exceeded.

use gelbe_leads::config::{RateLimitConfig, StealthConfig};
use gelbe_leads::fetch::{DomainKind, RateGovernor};

#[tokio::test]
async fn acquire_fails_cooperatively_once_the_session_duration_cap_has_elapsed() {
    let stealth = StealthConfig { enabled: true, max_session_duration_minutes: 0, ..StealthConfig::default() };
    let rate = RateLimitConfig { directory_min_delay: 0.0, directory_max_delay: 0.0, ..RateLimitConfig::default() };
    let governor = RateGovernor::new(rate, Some(stealth));

    // A zero-minute cap means any elapsed time already exceeds it.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    assert!(governor.session_limit_reached());
    let result = governor.acquire("example.test", DomainKind::Directory).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn acquire_succeeds_while_comfortably_under_every_stealth_ceiling() {
    let stealth = StealthConfig {
        enabled: true,
        min_delay: 0.0,
        max_delay: 0.0,
        max_session_duration_minutes: 180,
        max_requests_per_hour: 50,
        ..StealthConfig::default()
    };
    let rate = RateLimitConfig { directory_min_delay: 0.0, directory_max_delay: 0.0, ..RateLimitConfig::default() };
    let governor = RateGovernor::new(rate, Some(stealth));

    assert!(!governor.session_limit_reached());
    let result = governor.acquire("example.test", DomainKind::Directory).await;
    assert!(result.is_ok());
}
