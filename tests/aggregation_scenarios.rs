//! Integration coverage for cross-source aggregation scenarios that unit
//! tests on `aggregate::LeadAggregator` alone don't exercise end to end.

use std::collections::BTreeMap;

use gelbe_leads::aggregate::LeadAggregator;
use gelbe_leads::config::AggregatorConfig;
use gelbe_leads::model::{Address, Lead, Source};

fn primary_lead() -> Lead {
    let address = Address::new(None, None, Some("10115".into()), "Berlin".into(), None);
    let mut lead = Lead::new("Friseur Müller".into(), "Friseur".into(), address, Source::Directory, "https://gelbeseiten.de/x".into());
    lead.phone = Some("+49 30 12345678".into());
    lead
}

fn secondary_lead() -> Lead {
    let address = Address::new(None, None, Some("10115".into()), "Berlin".into(), None);
    let mut lead = Lead::new("Mueller Friseur".into(), "Friseur".into(), address, Source::Map, "https://maps.example/y".into());
    lead.phone = Some("030 12345678".into());
    lead.place_id = Some("CID-123".into());
    let mut hours = BTreeMap::new();
    hours.insert("Mo-Fr".to_string(), "09:00-18:00".to_string());
    lead.opening_hours = Some(hours);
    lead
}

#[test]
fn duplicate_by_phone_merges_into_single_enriched_lead() {
    let mut aggregator = LeadAggregator::new(AggregatorConfig::default());
    let result = aggregator.aggregate(vec![primary_lead()], vec![secondary_lead()]);

    assert_eq!(result.len(), 1);
    let merged = &result[0];
    assert_eq!(merged.name, "Friseur Müller");
    assert_eq!(merged.opening_hours.as_ref().and_then(|h| h.get("Mo-Fr")).map(String::as_str), Some("09:00-18:00"));
    assert_eq!(merged.place_id.as_deref(), Some("CID-123"));
    assert_eq!(merged.sources.len(), 2);
    assert_eq!(aggregator.stats().duplicates_found, 1);
}

#[test]
fn aggregating_against_an_empty_map_list_returns_directory_unchanged() {
    let directory = vec![primary_lead()];
    let mut aggregator = LeadAggregator::new(AggregatorConfig::default());
    let result = aggregator.aggregate(directory.clone(), Vec::new());

    assert_eq!(result.len(), directory.len());
    assert_eq!(result[0].name, directory[0].name);
    assert_eq!(aggregator.stats().duplicates_found, 0);
}

fn unrelated_lead() -> Lead {
    let address = Address::new(None, None, Some("80331".into()), "München".into(), None);
    let mut lead = Lead::new("Bäckerei Huber".into(), "Bäckerei".into(), address, Source::Directory, "https://gelbeseiten.de/z".into());
    lead.phone = Some("089 998877".into());
    lead
}

#[test]
fn aggregating_a_source_against_itself_collapses_every_lead_as_its_own_duplicate() {
    let leads = vec![primary_lead(), unrelated_lead()];
    let mut aggregator = LeadAggregator::new(AggregatorConfig::default());
    let result = aggregator.aggregate(leads.clone(), leads);

    assert_eq!(result.len(), 2);
    assert_eq!(aggregator.stats().duplicates_found, 2);
}
