//! CSV exporter (§6), grounded on the original `export/csv_export.py`.
//! Semicolon-delimited, UTF-8 with a BOM for Excel compatibility.

use std::io::Write;
use std::path::Path;

use crate::model::Lead;

/// Maximum opening-hours/website-signal entries rendered per row before the
/// original's own truncation kicks in.
const MAX_SIGNALS_PER_ROW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFieldSet {
    Minimal,
    Default,
    Full,
}

impl CsvFieldSet {
    fn columns(self) -> &'static [&'static str] {
        const MINIMAL: &[&str] =
            &["name", "category", "phone", "email", "website_url", "website_status", "postal_code", "city", "quality_score"];
        const DEFAULT: &[&str] = &[
            "name", "category", "phone", "email", "website_url", "website_status", "street", "house_number",
            "postal_code", "city", "region", "formatted_address", "rating", "rating_count", "quality_score",
            "source_url", "scraped_at",
        ];
        const FULL: &[&str] = &[
            "name", "category", "sub_category", "description", "phone", "phone_label", "fax", "email", "website_url",
            "website_status", "website_signals", "street", "house_number", "postal_code", "city", "region",
            "formatted_address", "rating", "rating_count", "opening_hours", "quality_score", "source_url", "place_id",
            "scraped_at",
        ];
        match self {
            Self::Minimal => MINIMAL,
            Self::Default => DEFAULT,
            Self::Full => FULL,
        }
    }
}

pub struct CsvExporter {
    delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl CsvExporter {
    #[must_use]
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Writes `leads` to `path` as CSV under `field_set`, UTF-8 with a BOM.
    pub fn export(&self, leads: &[Lead], path: &Path, field_set: CsvFieldSet) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(&[0xEF, 0xBB, 0xBF])?;
        self.write_to(&mut file, leads, field_set)
    }

    fn write_to<W: Write>(&self, writer: W, leads: &[Lead], field_set: CsvFieldSet) -> std::io::Result<()> {
        let mut csv_writer = ::csv::WriterBuilder::new().delimiter(self.delimiter).from_writer(writer);
        let columns = field_set.columns();
        csv_writer.write_record(columns)?;
        for lead in leads {
            let row = row_for(lead, columns);
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()
    }
}

fn row_for(lead: &Lead, columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| field_value(lead, column)).collect()
}

fn field_value(lead: &Lead, column: &str) -> String {
    match column {
        "name" => lead.name.clone(),
        "category" => lead.category.clone(),
        "sub_category" => lead.sub_category.clone().unwrap_or_default(),
        "description" => lead.description.as_deref().map(|d| d.chars().take(200).collect()).unwrap_or_default(),
        "phone" => lead.phone.clone().unwrap_or_default(),
        "phone_label" => lead.phone_label.clone().unwrap_or_default(),
        "fax" => lead.fax.clone().unwrap_or_default(),
        "email" => lead.email.clone().unwrap_or_default(),
        "website_url" => lead.website_url.clone().unwrap_or_default(),
        "website_status" => lead.website_verdict.verdict.as_str().to_string(),
        "website_signals" => lead.website_verdict.signals.iter().take(MAX_SIGNALS_PER_ROW).cloned().collect::<Vec<_>>().join("; "),
        "street" => lead.address.street.clone().unwrap_or_default(),
        "house_number" => lead.address.house_number.clone().unwrap_or_default(),
        "postal_code" => lead.address.postal_code.clone().unwrap_or_default(),
        "city" => lead.address.city.clone(),
        "region" => lead.address.region.clone().unwrap_or_default(),
        "formatted_address" => lead.address.format_full(),
        "rating" => lead.rating.map(|r| r.to_string()).unwrap_or_default(),
        "rating_count" => lead.rating_count.map(|c| c.to_string()).unwrap_or_default(),
        "opening_hours" => format_opening_hours(lead),
        "quality_score" => lead.quality_score().to_string(),
        "source_url" => lead.source_urls.first().cloned().unwrap_or_default(),
        "place_id" => lead.place_id.clone().unwrap_or_default(),
        "scraped_at" => lead.scraped_at.format("%Y-%m-%d %H:%M").to_string(),
        _ => String::new(),
    }
}

fn format_opening_hours(lead: &Lead) -> String {
    let Some(hours) = &lead.opening_hours else { return String::new() };
    hours.iter().map(|(day, range)| format!("{day}: {range}")).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Source};
    use std::io::Cursor;

    fn lead() -> Lead {
        let address = Address::new(Some("Hauptstr.".into()), Some("1".into()), Some("10115".into()), "Berlin".into(), None);
        let mut lead = Lead::new("Café Nord".into(), "Café".into(), address, Source::Directory, "https://example.test".into());
        lead.phone = Some("030123456".into());
        lead
    }

    #[test]
    fn minimal_field_set_has_nine_columns() {
        assert_eq!(CsvFieldSet::Minimal.columns().len(), 9);
    }

    #[test]
    fn default_field_set_has_seventeen_columns() {
        assert_eq!(CsvFieldSet::Default.columns().len(), 17);
    }

    #[test]
    fn writes_semicolon_delimited_row() {
        let exporter = CsvExporter::default();
        let mut buffer = Vec::new();
        exporter.write_to(Cursor::new(&mut buffer), std::slice::from_ref(&lead()), CsvFieldSet::Minimal).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Café Nord;Café;030123456"));
    }
}
