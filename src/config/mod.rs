//! Central configuration, mirroring the ambient config-layer pattern (SPEC_FULL §1a):
//! nested per-concern structs with `Default` impls and CLI-driven overrides.

mod types;

pub use types::{
    AggregatorConfig, DataSource, ExportConfig, FilterConfig, OutputFormat, ProxyConfig,
    RateLimitConfig, RunConfig, StealthConfig, WebsiteCheckDepth,
};
