//! The anti-detection fetch substrate (§4.A-D): identity pool, rate governor,
//! proxy rotator and the fetch client built atop them.

pub mod client;
pub mod proxy_rotator;
pub mod rate_governor;
pub mod ua_pool;

pub use client::FetchClient;
pub use proxy_rotator::ProxyRotator;
pub use rate_governor::{DomainKind, RateGovernor};
pub use ua_pool::UserAgentPool;
