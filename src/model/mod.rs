//! The data model (§3): Address, WebsiteVerdict, Lead, ListingStub, RunResult, RunStats.

mod address;
mod lead;
mod listing;
mod run;
mod verdict;

pub use address::Address;
pub use lead::Lead;
pub use listing::ListingStub;
pub use run::{RunResult, RunStats};
pub use verdict::{ProbeLevel, Verdict, WebsiteVerdict};

/// The source a record or field was discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Directory,
    Map,
}

impl Source {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Map => "map",
        }
    }
}
