//! Configuration types, grounded on the original `config/settings.py` dataclasses
//! and adapted to the teacher's `CrawlConfig` builder/getter style.

use serde::{Deserialize, Serialize};

/// Depth of the website-age classification cascade (§4.L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteCheckDepth {
    Fast,
    Normal,
    Thorough,
}

impl Default for WebsiteCheckDepth {
    fn default() -> Self {
        Self::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Directory,
    Map,
    All,
}

/// Rate Governor parameters (§4.B), grounded on `RateLimitConfig` in the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub directory_min_delay: f64,
    pub directory_max_delay: f64,
    pub directory_pause_every_n_requests: u32,
    pub directory_pause_min_duration: f64,
    pub directory_pause_max_duration: f64,

    pub map_min_delay: f64,
    pub map_max_delay: f64,

    pub external_min_delay: f64,
    pub external_max_delay: f64,

    pub max_retries: u32,
    pub backoff_factor: f64,
    pub retry_status_codes: Vec<u16>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            directory_min_delay: 2.0,
            directory_max_delay: 4.0,
            directory_pause_every_n_requests: 20,
            directory_pause_min_duration: 15.0,
            directory_pause_max_duration: 30.0,

            map_min_delay: 3.0,
            map_max_delay: 6.0,

            external_min_delay: 1.0,
            external_max_delay: 2.0,

            max_retries: 3,
            backoff_factor: 2.0,
            retry_status_codes: crate::utils::RETRY_STATUS_CODES.to_vec(),
        }
    }
}

/// Stealth-mode parameters (§4.B), grounded on `StealthConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StealthConfig {
    pub enabled: bool,
    pub min_delay: f64,
    pub max_delay: f64,
    pub requests_before_break: u32,
    pub break_min_duration: f64,
    pub break_max_duration: f64,
    pub max_requests_per_hour: u32,
    pub max_session_duration_minutes: u32,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_delay: 30.0,
            max_delay: 90.0,
            requests_before_break: 12,
            break_min_duration: 180.0,
            break_max_duration: 480.0,
            max_requests_per_hour: 50,
            max_session_duration_minutes: 180,
        }
    }
}

/// Proxy Rotator parameters (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub proxy_file: Option<String>,
    pub rotate_every_n_requests: u32,
    pub max_failures_before_block: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            proxy_file: None,
            rotate_every_n_requests: 10,
            max_failures_before_block: 5,
        }
    }
}

/// Filter/Ranker policy gates (§4.N).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub include_no_website: bool,
    pub include_old_website: bool,
    pub include_modern_website: bool,
    pub include_unknown_website: bool,
    pub min_quality_score: u8,
    pub require_phone: bool,
    pub require_email: bool,
    pub require_address: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_no_website: true,
            include_old_website: true,
            include_modern_website: false,
            include_unknown_website: true,
            min_quality_score: 0,
            require_phone: false,
            require_email: false,
            require_address: false,
        }
    }
}

/// Lead Aggregator weighting (§4.M).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub phone_match_weight: f64,
    pub name_match_weight: f64,
    pub address_match_weight: f64,
    pub min_similarity_threshold: f64,
    /// When a duplicate pair is found, merge the newer record's fields into
    /// the kept lead. When false, the duplicate is only counted and the
    /// first-seen record is kept untouched.
    pub prefer_newer_data: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            phone_match_weight: 1.0,
            name_match_weight: 0.8,
            address_match_weight: 0.6,
            min_similarity_threshold: 0.85,
            prefer_newer_data: true,
        }
    }
}

/// Export parameters (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_format: OutputFormat,
    pub output_path: Option<std::path::PathBuf>,
    pub pretty_print: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Json,
            output_path: None,
            pretty_print: true,
        }
    }
}

/// Top-level run configuration, combining every sub-config (§6 CLI surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub category: String,
    pub city: String,
    pub max_leads: usize,
    pub max_pages: usize,
    pub website_check_depth: WebsiteCheckDepth,
    pub sources: DataSource,

    pub rate_limit: RateLimitConfig,
    pub filter: FilterConfig,
    pub export: ExportConfig,
    pub proxy: ProxyConfig,
    pub aggregator: AggregatorConfig,
    pub stealth: StealthConfig,

    pub headless: bool,
    pub verbose: bool,
    pub debug: bool,
    pub quiet: bool,
}

impl RunConfig {
    #[must_use]
    pub fn new(category: String, city: String) -> Self {
        Self {
            category,
            city,
            max_leads: 100,
            max_pages: 50,
            website_check_depth: WebsiteCheckDepth::default(),
            sources: DataSource::Directory,
            rate_limit: RateLimitConfig::default(),
            filter: FilterConfig::default(),
            export: ExportConfig::default(),
            proxy: ProxyConfig::default(),
            aggregator: AggregatorConfig::default(),
            stealth: StealthConfig::default(),
            headless: true,
            verbose: false,
            debug: false,
            quiet: false,
        }
    }

    /// Filename stem for checkpoint and default output files, slugified from
    /// category and city (mirrors `Settings.get_output_filename`).
    #[must_use]
    pub fn city_slug(&self) -> String {
        self.city.to_lowercase().replace(' ', "_")
    }
}
