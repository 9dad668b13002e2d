//! Detail Parser (§4.G): extracts a full `Lead` from a directory detail page,
//! grounded on the original `detail.py`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::model::{Address, Lead, Source};
use crate::utils::DESCRIPTION_MAX_CHARS;

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

static STREET_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?)\s+(\d+\s*[a-zA-Z]?)$").expect("valid regex"));
static PLZ_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{5})\s+([A-Za-zäöüßÄÖÜ\-\s]+)").expect("valid regex"));
static STREET_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Za-zäöüßÄÖÜ.\-]+(?:str\.|straße|weg|platz|allee|ring|gasse|damm|ufer)?)\s*(\d+\s*[a-zA-Z]?)?")
        .expect("valid regex")
});
static REDIRECT_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]url=([^&]+)").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex"));
static FAX_LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Fax[:\s]*([\d\s\-/+]+)").expect("valid regex"));
static DAY_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(Mo(?:ntag)?|Di(?:enstag)?|Mi(?:ttwoch)?|Do(?:nnerstag)?|Fr(?:eitag)?|Sa(?:mstag)?|So(?:nntag)?).*?(\d{1,2}[:.]\d{2})\s*[-\u{2013}]\s*(\d{1,2}[:.]\d{2})")
        .expect("valid regex")
});

const NAME_SELECTORS: &[&str] = &["h1[itemprop='name']", "h1.mod-TeilnehmerKopf__name", "h1.firma-name", "h1"];
const ADDRESS_CONTAINER_SELECTORS: &str = "address, [itemprop='address'], .mod-TeilnehmerKopf__adresse, .adresse";
const PHONE_SELECTORS: &[&str] = &["a[href^='tel:']", "[itemprop='telephone']", ".mod-TeilnehmerKopf__telefon", ".telefon", ".phone"];
const FAX_SELECTORS: &[&str] = &["[itemprop='faxNumber']", ".fax"];
const EMAIL_SELECTORS: &[&str] = &["a[href^='mailto:']", "[itemprop='email']", ".email", ".mail"];
const WEBSITE_SELECTORS: &[&str] = &["a[data-wipe-name='Website']", "a.mod-TeilnehmerKopf__website", "[itemprop='url']", "a.website"];
const CATEGORY_SELECTORS: &[&str] = &[".mod-TeilnehmerKopf__branchen", "[itemprop='description']", ".branchen", ".kategorie", ".branche"];
const RATING_CONTAINER_SELECTOR: &str = ".mod-Bewertung, .bewertung, [itemprop='aggregateRating']";
const HOURS_CONTAINER_SELECTOR: &str = ".mod-Oeffnungszeiten, .oeffnungszeiten, [itemprop='openingHours']";
const DESCRIPTION_SELECTORS: &[&str] = &[".mod-TeilnehmerInfo__beschreibung", ".beschreibung", "[itemprop='description']", ".about"];

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_of(el: ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn clean_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || "+-/ ".contains(*c)).collect();
    let cleaned = clean_text(&cleaned);
    if cleaned.chars().filter(char::is_ascii_digit).count() >= 6 {
        Some(cleaned)
    } else {
        None
    }
}

/// Extracts a complete `Lead` from a directory detail page (§4.G). Returns
/// `None` only when no usable company name can be found.
pub struct DetailParser;

impl DetailParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn parse(&self, html: &str, source_url: &str, fallback_city: &str, fallback_category: &str) -> Option<Lead> {
        let doc = Html::parse_document(html);

        let name = Self::extract_name(&doc)?;
        let address = Self::extract_address(&doc, fallback_city);
        let category = Self::extract_category(&doc).unwrap_or_else(|| fallback_category.to_string());

        let mut lead = Lead::new(name, category, address, Source::Directory, source_url.to_string());
        let (phone, phone_label) = Self::extract_phone(&doc);
        lead.phone = phone;
        lead.phone_label = phone_label;
        lead.fax = Self::extract_fax(&doc);
        if let Some(email) = Self::extract_email(&doc) {
            lead.set_email(email);
        }
        lead.website_url = Self::extract_website(&doc);
        let (rating, rating_count) = Self::extract_rating(&doc);
        lead.rating = rating;
        lead.rating_count = rating_count;
        lead.opening_hours = Self::extract_opening_hours(&doc);
        lead.description = Self::extract_description(&doc);

        Some(lead)
    }

    fn extract_name(doc: &Html) -> Option<String> {
        for selector in NAME_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let name = clean_text(&text_of(elem));
                if name.chars().count() > 1 {
                    return Some(name);
                }
            }
        }
        None
    }

    fn parse_street(text: &str) -> (Option<String>, Option<String>) {
        if text.trim().is_empty() {
            return (None, None);
        }
        if let Some(c) = STREET_NUMBER_RE.captures(text.trim()) {
            return (Some(c[1].trim().to_string()), Some(c[2].trim().to_string()));
        }
        (Some(text.trim().to_string()), None)
    }

    fn parse_address_text(text: &str) -> (Option<String>, Option<String>, Option<String>, Option<String>) {
        let (mut plz, mut city) = (None, None);
        if let Some(c) = PLZ_CITY_RE.captures(text) {
            plz = Some(c[1].to_string());
            city = Some(c[2].trim().to_string());
        }
        let (mut street, mut house_number) = (None, None);
        if let Some(c) = STREET_TEXT_RE.captures(text) {
            street = Some(c[1].trim().to_string());
            house_number = c.get(2).map(|m| m.as_str().trim().to_string());
        }
        if street.as_deref().is_some_and(str::is_empty) {
            street = None;
        }
        (street, house_number, plz, city)
    }

    fn extract_address(doc: &Html, fallback_city: &str) -> Address {
        let container = doc.select(&sel(ADDRESS_CONTAINER_SELECTORS)).next();

        let mut street = container.and_then(|c| c.select(&sel("[itemprop='streetAddress'], .street, .strasse")).next());
        let (mut street_name, mut house_number) = match street.take() {
            Some(elem) => Self::parse_street(&text_of(elem)),
            None => (None, None),
        };

        let mut postal_code = container
            .and_then(|c| c.select(&sel("[itemprop='postalCode'], .plz, .zip")).next())
            .and_then(|e| Regex::new(r"\d{5}").expect("valid regex").find(&text_of(e)).map(|m| m.as_str().to_string()));

        let mut city = container
            .and_then(|c| c.select(&sel("[itemprop='addressLocality'], .city, .stadt, .ort")).next())
            .map(|e| text_of(e));

        let region = container
            .and_then(|c| c.select(&sel("[itemprop='addressRegion'], .bundesland, .region")).next())
            .map(|e| text_of(e));

        if street_name.is_none() || postal_code.is_none() {
            let address_text = container.map(|c| text_of(c)).unwrap_or_default();
            let (s, h, p, c) = Self::parse_address_text(&address_text);
            street_name = street_name.or(s);
            house_number = house_number.or(h);
            postal_code = postal_code.or(p);
            city = city.or(c);
        }

        Address::new(street_name, house_number, postal_code, city.unwrap_or_else(|| fallback_city.to_string()), region)
    }

    fn extract_phone(doc: &Html) -> (Option<String>, Option<String>) {
        for selector in PHONE_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let raw = if elem.value().name() == "a" {
                    elem.value().attr("href").and_then(|h| h.strip_prefix("tel:")).map(ToString::to_string)
                } else {
                    None
                };
                let text = raw.unwrap_or_else(|| text_of(elem));
                if let Some(phone) = clean_phone(&text) {
                    return (Some(phone), None);
                }
            }
        }
        (None, None)
    }

    fn extract_fax(doc: &Html) -> Option<String> {
        for selector in FAX_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                if let Some(fax) = clean_phone(&text_of(elem)) {
                    return Some(fax);
                }
            }
        }
        let body = text_of(doc.root_element());
        FAX_LABEL_RE.captures(&body).and_then(|c| clean_phone(&c[1]))
    }

    fn extract_email(doc: &Html) -> Option<String> {
        for selector in EMAIL_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let email = if elem.value().name() == "a" {
                    elem.value()
                        .attr("href")
                        .and_then(|h| h.strip_prefix("mailto:"))
                        .map(|h| h.split('?').next().unwrap_or(h).to_string())
                } else {
                    Some(text_of(elem))
                };
                if let Some(email) = email {
                    let email = email.trim().to_lowercase();
                    if EMAIL_RE.is_match(&email) {
                        return Some(email);
                    }
                }
            }
        }
        let body = text_of(doc.root_element());
        EMAIL_RE.find(&body).map(|m| m.as_str().to_lowercase())
    }

    fn extract_website(doc: &Html) -> Option<String> {
        for selector in WEBSITE_SELECTORS {
            let Some(elem) = doc.select(&sel(selector)).next() else { continue };
            let href = elem.value().attr("href").unwrap_or_default();
            if href.contains("redirect") || href.contains("url=") {
                if let Some(c) = REDIRECT_URL_RE.captures(href) {
                    let decoded = urlencoding::decode(&c[1]).map(|s| s.into_owned()).unwrap_or_else(|_| c[1].to_string());
                    if Self::is_valid_website(&decoded) {
                        return Some(decoded);
                    }
                }
            } else if href.starts_with("http") && !href.contains("gelbeseiten.de") && Self::is_valid_website(href) {
                return Some(href.to_string());
            }
        }
        None
    }

    fn is_valid_website(url: &str) -> bool {
        (url.starts_with("http://") || url.starts_with("https://")) && !url.contains("gelbeseiten.de")
    }

    fn extract_category(doc: &Html) -> Option<String> {
        for selector in CATEGORY_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let mut category = clean_text(&text_of(elem));
                if category.chars().count() > 2 {
                    if category.chars().count() > 100 {
                        category = format!("{}...", category.chars().take(97).collect::<String>());
                    }
                    return Some(category);
                }
            }
        }
        None
    }

    fn extract_rating(doc: &Html) -> (Option<f32>, Option<u32>) {
        let Some(container) = doc.select(&sel(RATING_CONTAINER_SELECTOR)).next() else { return (None, None) };

        let rating = container
            .select(&sel("[itemprop='ratingValue'], .wert, .value"))
            .next()
            .and_then(|e| text_of(e).replace(',', ".").parse::<f32>().ok())
            .map(|r| r.clamp(0.0, 5.0));

        let count = container
            .select(&sel("[itemprop='reviewCount'], .anzahl, .count"))
            .next()
            .and_then(|e| Regex::new(r"\d+").unwrap().find(&text_of(e)).and_then(|m| m.as_str().parse::<u32>().ok()));

        (rating, count)
    }

    fn extract_opening_hours(doc: &Html) -> Option<std::collections::BTreeMap<String, String>> {
        let container = doc.select(&sel(HOURS_CONTAINER_SELECTOR)).next()?;
        let mut hours = std::collections::BTreeMap::new();
        for row in container.select(&sel("tr, li, .row")) {
            let text = text_of(row);
            if let Some(c) = DAY_TIME_RE.captures(&text) {
                let day = Self::normalize_day(&c[1]);
                hours.insert(day, format!("{} - {}", &c[2], &c[3]));
            }
        }
        if hours.is_empty() {
            None
        } else {
            Some(hours)
        }
    }

    fn normalize_day(day: &str) -> String {
        let lower = day.to_lowercase();
        let full = match lower.as_str() {
            s if s.starts_with("mo") => "Montag",
            s if s.starts_with("di") => "Dienstag",
            s if s.starts_with("mi") => "Mittwoch",
            s if s.starts_with("do") => "Donnerstag",
            s if s.starts_with("fr") => "Freitag",
            s if s.starts_with("sa") => "Samstag",
            s if s.starts_with("so") => "Sonntag",
            _ => day,
        };
        full.to_string()
    }

    fn extract_description(doc: &Html) -> Option<String> {
        for selector in DESCRIPTION_SELECTORS {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let mut desc = clean_text(&text_of(elem));
                if desc.chars().count() > 20 {
                    if desc.chars().count() > DESCRIPTION_MAX_CHARS {
                        desc = format!("{}...", desc.chars().take(DESCRIPTION_MAX_CHARS - 3).collect::<String>());
                    }
                    return Some(desc);
                }
            }
        }
        None
    }
}

impl Default for DetailParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <h1 itemprop="name">Beispiel GmbH</h1>
        <address itemprop="address">
            <span itemprop="streetAddress">Musterstr. 1</span>
            <span itemprop="postalCode">12345</span>
            <span itemprop="addressLocality">Berlin</span>
        </address>
        <a itemprop="telephone" href="tel:+49301234567">+49 30 1234567</a>
        <a href="mailto:info@beispiel.de">info@beispiel.de</a>
        <a itemprop="url" href="/redirect?url=https%3A%2F%2Fbeispiel.de">Website</a>
        <div class="branchen">Friseur</div>
        </body></html>
    "#;

    #[test]
    fn parses_a_detail_page() {
        let lead = DetailParser::new().parse(SAMPLE, "https://www.gelbeseiten.de/gsbiz/x", "Unbekannt", "Unbekannt").unwrap();
        assert_eq!(lead.name, "Beispiel GmbH");
        assert_eq!(lead.address.postal_code.as_deref(), Some("12345"));
        assert_eq!(lead.address.city, "Berlin");
        assert_eq!(lead.phone.as_deref(), Some("+49301234567"));
        assert_eq!(lead.email.as_deref(), Some("info@beispiel.de"));
        assert_eq!(lead.website_url.as_deref(), Some("https://beispiel.de"));
        assert_eq!(lead.category, "Friseur");
    }

    #[test]
    fn missing_name_returns_none() {
        let lead = DetailParser::new().parse("<html><body><p>no name here</p></body></html>", "https://x.test", "Berlin", "Unbekannt");
        assert!(lead.is_none());
    }
}
