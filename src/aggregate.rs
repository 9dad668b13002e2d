//! Lead Aggregator (§4.M): merges directory and map leads into a single
//! deduplicated list, grounded on the original `pipeline/aggregator.py`.

use std::collections::BTreeMap;

use crate::config::AggregatorConfig;
use crate::matching::{is_duplicate, merge_leads};
use crate::model::Lead;

/// Counts produced by the most recent [`LeadAggregator::aggregate`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationStats {
    pub directory_input: usize,
    pub map_input: usize,
    pub total_input: usize,
    pub duplicates_found: usize,
    pub merged_leads: usize,
    pub unique_leads: usize,
    pub output_count: usize,
}

pub struct LeadAggregator {
    config: AggregatorConfig,
    stats: AggregationStats,
}

impl LeadAggregator {
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config, stats: AggregationStats::default() }
    }

    #[must_use]
    pub fn stats(&self) -> AggregationStats {
        self.stats
    }

    fn is_duplicate_pair(&self, a: &Lead, b: &Lead) -> (bool, f64) {
        let result = is_duplicate(
            a,
            b,
            self.config.phone_match_weight,
            self.config.name_match_weight,
            self.config.address_match_weight,
            self.config.min_similarity_threshold,
        );
        (result.is_match, result.confidence)
    }

    /// Merges `map_leads` into `directory_leads`, the directory list acting
    /// as the primary source (§4.M). Each incoming map lead is matched
    /// against the result list as it stands *at that point* — a map lead can
    /// match and merge into a map lead appended earlier in the same call.
    pub fn aggregate(&mut self, directory_leads: Vec<Lead>, map_leads: Vec<Lead>) -> Vec<Lead> {
        self.stats = AggregationStats {
            directory_input: directory_leads.len(),
            map_input: map_leads.len(),
            total_input: directory_leads.len() + map_leads.len(),
            ..AggregationStats::default()
        };

        let mut result = directory_leads;

        for map_lead in map_leads {
            let mut best_index = None;
            let mut best_confidence = 0.0f64;

            for (index, existing) in result.iter().enumerate() {
                let (is_match, confidence) = self.is_duplicate_pair(existing, &map_lead);
                if is_match && confidence > best_confidence {
                    best_confidence = confidence;
                    best_index = Some(index);
                }
            }

            if let Some(index) = best_index {
                let primary = result.remove(index);
                result.insert(index, merge_leads(primary, map_lead));
                self.stats.duplicates_found += 1;
                self.stats.merged_leads += 1;
            } else {
                result.push(map_lead);
                self.stats.unique_leads += 1;
            }
        }

        self.stats.output_count = result.len();
        result
    }

    /// Single-source dedup: collapses duplicates found within one list.
    #[must_use]
    pub fn deduplicate(&self, leads: Vec<Lead>) -> Vec<Lead> {
        let mut result: Vec<Lead> = Vec::with_capacity(leads.len());
        for lead in leads {
            let mut best_index = None;
            let mut best_confidence = 0.0f64;
            for (index, existing) in result.iter().enumerate() {
                let (is_match, confidence) = self.is_duplicate_pair(existing, &lead);
                if is_match && confidence > best_confidence {
                    best_confidence = confidence;
                    best_index = Some(index);
                }
            }
            if let Some(index) = best_index {
                if self.config.prefer_newer_data {
                    let primary = result.remove(index);
                    result.insert(index, merge_leads(primary, lead));
                }
                // else: keep the first-seen record untouched, dropping `lead`.
            } else {
                result.push(lead);
            }
        }
        result
    }

    /// All-pairs duplicate finder, for diagnostics only (§4.M).
    #[must_use]
    pub fn find_duplicates<'a>(&self, leads: &'a [Lead]) -> Vec<(&'a Lead, &'a Lead, f64)> {
        let mut pairs = Vec::new();
        for i in 0..leads.len() {
            for j in (i + 1)..leads.len() {
                let (is_match, confidence) = self.is_duplicate_pair(&leads[i], &leads[j]);
                if is_match {
                    pairs.push((&leads[i], &leads[j], confidence));
                }
            }
        }
        pairs
    }

    /// Groups leads by postal code, falling back to lowercased city, falling
    /// back to `"unknown"`.
    #[must_use]
    pub fn group_by_location(&self, leads: Vec<Lead>) -> BTreeMap<String, Vec<Lead>> {
        let mut groups: BTreeMap<String, Vec<Lead>> = BTreeMap::new();
        for lead in leads {
            let key = lead
                .address
                .postal_code
                .clone()
                .filter(|plz| !plz.is_empty())
                .or_else(|| Some(lead.address.city.to_lowercase()).filter(|c| !c.is_empty()))
                .unwrap_or_else(|| "unknown".to_string());
            groups.entry(key).or_default().push(lead);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Source};

    fn lead(name: &str, phone: Option<&str>, city: &str, source: Source) -> Lead {
        let address = Address::new(Some("Hauptstr.".into()), Some("1".into()), Some("10115".into()), city.to_string(), None);
        let mut lead = Lead::new(name.to_string(), "Bäckerei".to_string(), address, source, "https://example.test".to_string());
        lead.phone = phone.map(ToString::to_string);
        lead
    }

    #[test]
    fn merges_matching_map_lead_into_directory_lead() {
        let directory = vec![lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory)];
        let map = vec![lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Map)];

        let mut aggregator = LeadAggregator::new(AggregatorConfig::default());
        let result = aggregator.aggregate(directory, map);

        assert_eq!(result.len(), 1);
        assert_eq!(aggregator.stats().merged_leads, 1);
        assert_eq!(aggregator.stats().unique_leads, 0);
    }

    #[test]
    fn keeps_unmatched_map_lead_as_unique() {
        let directory = vec![lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory)];
        let map = vec![lead("Friseur Müller", Some("030 999999"), "München", Source::Map)];

        let mut aggregator = LeadAggregator::new(AggregatorConfig::default());
        let result = aggregator.aggregate(directory, map);

        assert_eq!(result.len(), 2);
        assert_eq!(aggregator.stats().unique_leads, 1);
    }

    #[test]
    fn deduplicate_keeps_first_seen_record_when_prefer_newer_data_is_off() {
        let mut first = lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory);
        first.email = Some("first@example.test".to_string());
        let mut second = lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory);
        second.email = Some("second@example.test".to_string());

        let config = AggregatorConfig { prefer_newer_data: false, ..AggregatorConfig::default() };
        let aggregator = LeadAggregator::new(config);
        let result = aggregator.deduplicate(vec![first, second]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].email.as_deref(), Some("first@example.test"));
    }

    #[test]
    fn deduplicate_merges_when_prefer_newer_data_is_on() {
        let mut first = lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory);
        first.email = Some("first@example.test".to_string());
        let second = lead("Bäckerei Schmidt", Some("030 123456"), "Berlin", Source::Directory);

        let aggregator = LeadAggregator::new(AggregatorConfig::default());
        let result = aggregator.deduplicate(vec![first, second]);

        assert_eq!(result.len(), 1);
    }

    #[test]
    fn groups_by_postal_code() {
        let leads = vec![
            lead("A", None, "Berlin", Source::Directory),
            lead("B", None, "Berlin", Source::Directory),
        ];
        let aggregator = LeadAggregator::new(AggregatorConfig::default());
        let groups = aggregator.group_by_location(leads);
        assert_eq!(groups.get("10115").map(Vec::len), Some(2));
    }
}
