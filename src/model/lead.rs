//! Lead (§3): the stable, uniquely-addressable output record.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Address, Source, WebsiteVerdict};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub category: String,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub address: Address,
    pub phone: Option<String>,
    /// Label attached to the phone number, e.g. "Zentrale" / "Mobil".
    pub phone_label: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub website_url: Option<String>,
    pub website_verdict: WebsiteVerdict,
    pub rating: Option<f32>,
    pub rating_count: Option<u32>,
    pub opening_hours: Option<BTreeMap<String, String>>,
    pub source_urls: Vec<String>,
    pub directory_id: Option<String>,
    pub place_id: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub sources: BTreeSet<Source>,
}

impl Lead {
    #[must_use]
    pub fn new(name: String, category: String, address: Address, source: Source, source_url: String) -> Self {
        let mut sources = BTreeSet::new();
        sources.insert(source);
        Self {
            name,
            category,
            sub_category: None,
            description: None,
            address,
            phone: None,
            phone_label: None,
            fax: None,
            email: None,
            website_url: None,
            website_verdict: WebsiteVerdict::default(),
            rating: None,
            rating_count: None,
            opening_hours: None,
            source_urls: vec![source_url],
            directory_id: None,
            place_id: None,
            scraped_at: Utc::now(),
            sources,
        }
    }

    /// Set the email, discarding it entirely when it fails the basic
    /// address-pattern invariant (§3) rather than merely flagging it.
    pub fn set_email(&mut self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        if EMAIL_RE.is_match(&candidate) {
            self.email = Some(candidate);
        }
    }

    #[must_use]
    pub fn has_website(&self) -> bool {
        self.website_url.is_some()
    }

    /// The quality-score rubric (§3, scenario 6 of §8): phone +20, email +25,
    /// website +15, full address +15 or partial +7, rating +10 **only when
    /// both rating and rating_count are present**, hours +5, description +10,
    /// clamped to [0,100].
    #[must_use]
    pub fn quality_score(&self) -> u8 {
        let mut score: i32 = 0;
        if self.phone.is_some() {
            score += 20;
        }
        if self.email.is_some() {
            score += 25;
        }
        if self.website_url.is_some() {
            score += 15;
        }
        if self.address.is_full() {
            score += 15;
        } else if self.address.is_partial() {
            score += 7;
        }
        if self.rating.is_some() && self.rating_count.is_some() {
            score += 10;
        }
        if self.opening_hours.as_ref().is_some_and(|h| !h.is_empty()) {
            score += 5;
        }
        if self.description.as_ref().is_some_and(|d| !d.is_empty()) {
            score += 10;
        }
        score.clamp(0, 100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_lead() -> Lead {
        let address = Address::new(
            Some("Musterstr.".into()),
            Some("1".into()),
            Some("12345".into()),
            "Berlin".into(),
            None,
        );
        Lead::new("Test GmbH".into(), "Friseur".into(), address, Source::Directory, "https://example.test/1".into())
    }

    #[test]
    fn quality_score_rubric_without_rating_or_hours() {
        let mut lead = base_lead();
        lead.phone = Some("030123456".into());
        lead.set_email("info@example.test");
        lead.website_url = Some("https://example.test".into());
        assert_eq!(lead.quality_score(), 75);
    }

    #[test]
    fn quality_score_gains_five_for_hours() {
        let mut lead = base_lead();
        lead.phone = Some("030123456".into());
        lead.set_email("info@example.test");
        lead.website_url = Some("https://example.test".into());
        let mut hours = BTreeMap::new();
        hours.insert("Montag".to_string(), "09:00-18:00".to_string());
        lead.opening_hours = Some(hours);
        assert_eq!(lead.quality_score(), 80);
    }

    #[test]
    fn quality_score_clamps_at_100() {
        let mut lead = base_lead();
        lead.phone = Some("030123456".into());
        lead.set_email("info@example.test");
        lead.website_url = Some("https://example.test".into());
        lead.rating = Some(4.5);
        lead.rating_count = Some(12);
        lead.description = Some("A shop".into());
        let mut hours = BTreeMap::new();
        hours.insert("Montag".to_string(), "09:00-18:00".to_string());
        lead.opening_hours = Some(hours);
        assert_eq!(lead.quality_score(), 100);
    }

    #[test]
    fn rating_without_count_does_not_score() {
        let mut lead = base_lead();
        lead.rating = Some(4.5);
        assert_eq!(lead.quality_score(), 15);
    }

    #[test]
    fn invalid_email_is_discarded() {
        let mut lead = base_lead();
        lead.set_email("not-an-email");
        assert!(lead.email.is_none());
    }
}
