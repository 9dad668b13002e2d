//! JSON exporter (§6), grounded on the original `export/json_export.py`.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::{DataSource, ExportConfig, FilterConfig};
use crate::model::{Lead, RunResult, RunStats};

const FORMAT_VERSION: &str = "2.0";

/// Fields this crate structurally never collects, echoed in every export so
/// downstream consumers see the privacy contract rather than infer it.
const EXCLUDED_DATA: &[&str] = &["personal_reviews", "review_authors", "user_photos", "owner_names", "employee_names"];

pub struct JsonExporter {
    config: ExportConfig,
}

impl JsonExporter {
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Builds the full export document (§6: `meta`/`leads`/`stats`).
    #[must_use]
    pub fn build(
        &self,
        result: &RunResult,
        stats: &RunStats,
        category: &str,
        city: &str,
        sources: DataSource,
        filter: &FilterConfig,
    ) -> Value {
        let meta = self.build_meta(result, category, city, sources, filter);
        let leads: Vec<Value> = result.leads.iter().map(lead_to_value).collect();

        let mut stats_value = json!({
            "total_discovered": result.total_discovered,
            "total_exported": result.leads.len(),
            "pages_scraped": result.pages_scraped,
            "duration_seconds": round2(result.duration_seconds),
            "error_count": result.errors.len(),
            "directory_pages_scraped": stats.directory_pages_scraped,
            "map_pages_scraped": stats.map_pages_scraped,
            "duplicates_found": stats.duplicates_found,
            "merged": stats.merged,
            "websites_checked": stats.websites_checked,
            "verdict_old": stats.verdict_old,
            "verdict_modern": stats.verdict_modern,
            "verdict_unknown": stats.verdict_unknown,
            "verdict_absent": stats.verdict_absent,
        });
        if !result.errors.is_empty() {
            let errors: Vec<&String> = result.errors.iter().rev().take(10).collect();
            stats_value["errors"] = json!(errors);
        }

        json!({ "meta": meta, "leads": leads, "stats": stats_value })
    }

    fn build_meta(
        &self,
        result: &RunResult,
        category: &str,
        city: &str,
        sources: DataSource,
        filter: &FilterConfig,
    ) -> Value {
        json!({
            "category": category,
            "region": city,
            "count": result.leads.len(),
            "export_timestamp": Utc::now().to_rfc3339(),
            "format_version": FORMAT_VERSION,
            "sources": source_list(sources),
            "filter_criteria": {
                "include_no_website": filter.include_no_website,
                "include_old_website": filter.include_old_website,
                "include_modern_website": filter.include_modern_website,
                "min_quality_score": filter.min_quality_score,
            },
            "partial": result.partial,
            "privacy_notes": {
                "excluded_data": EXCLUDED_DATA,
                "legal_basis": "legitimate interest (B2B business data)",
            },
        })
    }

    /// Serializes `document` and writes it to `path`, honoring `pretty_print`.
    pub fn write(&self, document: &Value, path: &Path) -> std::io::Result<()> {
        let text = if self.config.pretty_print {
            serde_json::to_string_pretty(document).expect("Value always serializes")
        } else {
            serde_json::to_string(document).expect("Value always serializes")
        };
        std::fs::write(path, text)
    }

    #[must_use]
    pub fn to_string(&self, document: &Value) -> String {
        if self.config.pretty_print {
            serde_json::to_string_pretty(document).expect("Value always serializes")
        } else {
            serde_json::to_string(document).expect("Value always serializes")
        }
    }
}

fn source_list(sources: DataSource) -> Vec<&'static str> {
    match sources {
        DataSource::Directory => vec!["directory"],
        DataSource::Map => vec!["map"],
        DataSource::All => vec!["directory", "map"],
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Serialize)]
struct AddressJson<'a> {
    street: &'a Option<String>,
    house_number: &'a Option<String>,
    postal_code: &'a Option<String>,
    city: &'a str,
    region: &'a Option<String>,
    formatted: String,
}

fn lead_to_value(lead: &Lead) -> Value {
    let address = AddressJson {
        street: &lead.address.street,
        house_number: &lead.address.house_number,
        postal_code: &lead.address.postal_code,
        city: &lead.address.city,
        region: &lead.address.region,
        formatted: lead.address.format_full(),
    };

    json!({
        "name": lead.name,
        "category": lead.category,
        "sub_category": lead.sub_category,
        "phone": lead.phone,
        "phone_label": lead.phone_label,
        "email": lead.email,
        "website_url": lead.website_url,
        "website_status": lead.website_verdict.verdict.as_str(),
        "website_signals": lead.website_verdict.signals,
        "address": address,
        "rating": lead.rating,
        "rating_count": lead.rating_count,
        "opening_hours": lead.opening_hours,
        "quality_score": lead.quality_score(),
        "sources": lead.sources.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        "source_urls": lead.source_urls,
        "place_id": lead.place_id,
        "scraped_at": lead.scraped_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Source};

    #[test]
    fn builds_document_with_meta_leads_and_stats() {
        let address = Address::new(None, None, Some("10115".into()), "Berlin".into(), None);
        let lead = Lead::new("Café Nord".into(), "Café".into(), address, Source::Directory, "https://example.test".into());
        let mut result = RunResult::empty();
        result.leads.push(lead);
        result.total_discovered = 1;

        let exporter = JsonExporter::new(ExportConfig::default());
        let document = exporter.build(&result, &RunStats::default(), "Café", "Berlin", DataSource::Directory, &FilterConfig::default());

        assert_eq!(document["meta"]["format_version"], "2.0");
        assert_eq!(document["leads"].as_array().unwrap().len(), 1);
        assert_eq!(document["leads"][0]["name"], "Café Nord");
    }
}
