//! Filter/Ranker (§4.N): includes or excludes leads by configurable
//! criteria, grounded on the original `pipeline/filters.py`.

use std::collections::BTreeMap;

use crate::config::FilterConfig;
use crate::model::{Lead, Verdict};

#[derive(Debug, Clone)]
pub struct FilterResult {
    pub included: bool,
    pub reason: Option<String>,
}

impl FilterResult {
    fn included() -> Self {
        Self { included: true, reason: None }
    }

    fn excluded(reason: impl Into<String>) -> Self {
        Self { included: false, reason: Some(reason.into()) }
    }
}

pub type CustomFilter = Box<dyn Fn(&Lead) -> FilterResult + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterStats {
    pub total_processed: u64,
    pub total_included: u64,
}

impl FilterStats {
    #[must_use]
    pub fn total_excluded(&self) -> u64 {
        self.total_processed - self.total_included
    }

    #[must_use]
    pub fn inclusion_rate(&self) -> f64 {
        if self.total_processed == 0 {
            0.0
        } else {
            self.total_included as f64 / self.total_processed as f64
        }
    }
}

pub struct LeadFilter {
    config: FilterConfig,
    custom_filters: Vec<CustomFilter>,
    stats: FilterStats,
    exclusion_reasons: BTreeMap<String, u64>,
}

impl LeadFilter {
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self { config, custom_filters: Vec::new(), stats: FilterStats::default(), exclusion_reasons: BTreeMap::new() }
    }

    pub fn add_custom_filter(&mut self, filter: CustomFilter) {
        self.custom_filters.push(filter);
    }

    pub fn should_include(&mut self, lead: &Lead) -> FilterResult {
        self.stats.total_processed += 1;

        let result = self
            .check_website_verdict(lead)
            .and_then(|| self.check_quality_score(lead))
            .and_then(|| self.check_required_fields(lead))
            .and_then(|| {
                for filter in &self.custom_filters {
                    let result = filter(lead);
                    if !result.included {
                        return result;
                    }
                }
                FilterResult::included()
            });

        if result.included {
            self.stats.total_included += 1;
        } else if let Some(reason) = &result.reason {
            *self.exclusion_reasons.entry(reason.clone()).or_insert(0) += 1;
        }
        result
    }

    fn check_website_verdict(&self, lead: &Lead) -> FilterResult {
        match lead.website_verdict.verdict {
            Verdict::Absent => included_if(self.config.include_no_website, "website_status_keine"),
            Verdict::Old => included_if(self.config.include_old_website, "website_status_alt"),
            Verdict::Modern => included_if(self.config.include_modern_website, "website_status_modern"),
            Verdict::Unknown => included_if(self.config.include_unknown_website, "website_status_unbekannt"),
            Verdict::NotYetChecked => FilterResult::included(),
        }
    }

    fn check_quality_score(&self, lead: &Lead) -> FilterResult {
        let score = lead.quality_score();
        if score < self.config.min_quality_score {
            FilterResult::excluded(format!("quality_score_too_low_{score}"))
        } else {
            FilterResult::included()
        }
    }

    fn check_required_fields(&self, lead: &Lead) -> FilterResult {
        if self.config.require_phone && lead.phone.is_none() {
            return FilterResult::excluded("missing_phone");
        }
        if self.config.require_email && lead.email.is_none() {
            return FilterResult::excluded("missing_email");
        }
        if self.config.require_address && (lead.address.street.is_none() || lead.address.postal_code.is_none()) {
            return FilterResult::excluded("missing_address");
        }
        FilterResult::included()
    }

    pub fn filter_leads(&mut self, leads: Vec<Lead>) -> Vec<Lead> {
        leads.into_iter().filter(|lead| self.should_include(lead).included).collect()
    }

    #[must_use]
    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    #[must_use]
    pub fn exclusion_reasons(&self) -> &BTreeMap<String, u64> {
        &self.exclusion_reasons
    }

    pub fn reset_stats(&mut self) {
        self.stats = FilterStats::default();
        self.exclusion_reasons.clear();
    }
}

trait AndThen {
    fn and_then(self, next: impl FnOnce() -> FilterResult) -> FilterResult;
}

impl AndThen for FilterResult {
    fn and_then(self, next: impl FnOnce() -> FilterResult) -> FilterResult {
        if self.included {
            next()
        } else {
            self
        }
    }
}

fn included_if(allowed: bool, reason: &'static str) -> FilterResult {
    if allowed {
        FilterResult::included()
    } else {
        FilterResult::excluded(reason)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SortKey {
    Quality,
    Name,
    Rating,
}

/// Sorts `leads` by `key`, descending when `reverse` is set (§4.N). Quality
/// ties are always broken by ascending name, independent of `reverse`.
pub fn sort_leads(mut leads: Vec<Lead>, key: SortKey, reverse: bool) -> Vec<Lead> {
    match key {
        SortKey::Quality => leads.sort_by(|a, b| {
            a.quality_score().cmp(&b.quality_score()).then_with(|| b.name.to_lowercase().cmp(&a.name.to_lowercase()))
        }),
        SortKey::Name => leads.sort_by_key(|l| l.name.to_lowercase()),
        SortKey::Rating => {
            leads.sort_by(|a, b| {
                let a_key = (to_ordered(a.rating), a.rating_count.unwrap_or(0));
                let b_key = (to_ordered(b.rating), b.rating_count.unwrap_or(0));
                a_key.cmp(&b_key)
            });
        }
    }
    if reverse {
        leads.reverse();
    }
    leads
}

fn to_ordered(rating: Option<f32>) -> u32 {
    (rating.unwrap_or(0.0) * 100.0) as u32
}

/// Excludes leads whose name contains any blacklisted term (§4.N).
#[must_use]
pub fn create_blacklist_filter(blacklist: Vec<String>) -> CustomFilter {
    let blacklist: Vec<String> = blacklist.into_iter().map(|s| s.to_lowercase()).collect();
    Box::new(move |lead: &Lead| {
        let name_lower = lead.name.to_lowercase();
        for blocked in &blacklist {
            if name_lower.contains(blocked.as_str()) {
                return FilterResult::excluded(format!("blacklist_{blocked}"));
            }
        }
        FilterResult::included()
    })
}

/// Includes only leads whose category contains a whitelisted term (§4.N).
#[must_use]
pub fn create_whitelist_filter(whitelist: Vec<String>) -> CustomFilter {
    let whitelist: Vec<String> = whitelist.into_iter().map(|s| s.to_lowercase()).collect();
    Box::new(move |lead: &Lead| {
        let category_lower = lead.category.to_lowercase();
        for allowed in &whitelist {
            if category_lower.contains(allowed.as_str()) {
                return FilterResult::included();
            }
        }
        FilterResult::excluded("branche_not_in_whitelist")
    })
}

/// Includes only leads whose postal code starts with an allowed prefix; leads
/// without a postal code pass through (§4.N).
#[must_use]
pub fn create_region_filter(allowed_plz_prefixes: Vec<String>) -> CustomFilter {
    Box::new(move |lead: &Lead| {
        let Some(plz) = lead.address.postal_code.as_deref() else {
            return FilterResult::included();
        };
        for prefix in &allowed_plz_prefixes {
            if plz.starts_with(prefix.as_str()) {
                return FilterResult::included();
            }
        }
        FilterResult::excluded("plz_not_in_region")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Source};

    fn lead(name: &str) -> Lead {
        Lead::new(name.to_string(), "Bäckerei".to_string(), Address::empty("Berlin"), Source::Directory, "https://example.test".to_string())
    }

    #[test]
    fn excludes_leads_below_minimum_quality() {
        let config = FilterConfig { min_quality_score: 90, ..FilterConfig::default() };
        let mut filter = LeadFilter::new(config);
        let result = filter.should_include(&lead("Café Nord"));
        assert!(!result.included);
        assert!(result.reason.unwrap().starts_with("quality_score_too_low"));
    }

    #[test]
    fn excludes_missing_required_phone() {
        let config = FilterConfig { require_phone: true, ..FilterConfig::default() };
        let mut filter = LeadFilter::new(config);
        let result = filter.should_include(&lead("Café Nord"));
        assert_eq!(result.reason.as_deref(), Some("missing_phone"));
    }

    #[test]
    fn blacklist_filter_excludes_matching_name() {
        let mut filter = LeadFilter::new(FilterConfig::default());
        filter.add_custom_filter(create_blacklist_filter(vec!["nord".to_string()]));
        let result = filter.should_include(&lead("Café Nord"));
        assert!(!result.included);
    }

    #[test]
    fn sort_by_name_is_case_insensitive() {
        let leads = vec![lead("zebra"), lead("Apfel")];
        let sorted = sort_leads(leads, SortKey::Name, false);
        assert_eq!(sorted[0].name, "Apfel");
    }
}
