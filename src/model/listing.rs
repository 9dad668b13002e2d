//! ListingStub (§3): transient intermediate produced by list-page parsers.

use serde::{Deserialize, Serialize};

use super::Source;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingStub {
    pub name: String,
    pub detail_url: String,
    pub phone: Option<String>,
    pub raw_address: Option<String>,
    pub category: Option<String>,
    pub has_website: bool,
    pub website_url: Option<String>,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
    pub source: Source,
    pub place_id: Option<String>,
    pub opening_hours: Option<std::collections::BTreeMap<String, String>>,
}

impl ListingStub {
    #[must_use]
    pub fn new(name: String, detail_url: String, source: Source) -> Self {
        Self {
            name,
            detail_url,
            phone: None,
            raw_address: None,
            category: None,
            has_website: false,
            website_url: None,
            rating: None,
            rating_count: None,
            source,
            place_id: None,
            opening_hours: None,
        }
    }
}
