//! A lead-generation scraper: discovers small-business contact records from
//! a public directory (and, optionally, a map-service search), fuses
//! cross-source duplicates, and classifies each business's website by
//! apparent age so downstream sales tooling can target businesses without a
//! modern web presence.

pub mod aggregate;
pub mod browser;
pub mod browser_setup;
pub mod categories;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod kromekover;
pub mod matching;
pub mod model;
pub mod orchestrator;
pub mod parse;
pub mod utils;

pub use config::{DataSource, OutputFormat, RunConfig, WebsiteCheckDepth};
pub use error::{ScrapeError, ScrapeResult, SessionLimitReached};
pub use model::{Address, Lead, ListingStub, RunResult, RunStats, Source, Verdict, WebsiteVerdict};
pub use orchestrator::{Orchestrator, ProgressCallback};
