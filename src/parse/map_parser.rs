//! Map Parser (§4.H): extracts `ListingStub`s and `Lead`s from a map-service
//! result DOM, grounded on the original `google_maps.py`.
//!
//! **Privacy contract**: this parser never emits review text, review author
//! names, or user photos — enforced structurally, since `ListingStub`/`Lead`
//! carry no such fields.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::model::{Address, Lead, ListingStub, Source};

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

const RESULT_CARD_SELECTORS: &[&str] = &["div[data-result-index]", "div.Nv2PK", "a[data-cid]"];
const NAME_SELECTORS: &[&str] = &["div.fontHeadlineSmall", "div.qBF1Pd", "h3.fontHeadlineSmall", "span.fontHeadlineSmall"];
const ADDRESS_SELECTORS: &[&str] = &["div.W4Efsd:last-child", "span.W4Efsd", "[data-item-id*='address']"];
const CATEGORY_SELECTORS: &[&str] = &["div.W4Efsd span:first-child", "span.DkEaL"];
const STREET_PATTERNS: &[&str] = &["straße", "str.", "weg", "platz", "allee", "gasse", "ring", "damm", "ufer"];

static PLZ_CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{5})\s+([A-Za-zäöüßÄÖÜ\-]+)").expect("valid regex"));
static TEL_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(\+49[\d\s\-/]+\d)").expect("valid regex"),
        Regex::new(r"(0\d{2,4}[\s\-/]?\d{3,}[\s\-/]?\d{2,})").expect("valid regex"),
    ]
});

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_of(el: ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn clean_phone(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || "+-/ ".contains(*c)).collect();
    clean_text(&cleaned)
}

fn looks_like_address(text: &str) -> bool {
    if text.chars().count() < 5 {
        return false;
    }
    if PLZ_CITY_RE.is_match(text) {
        return true;
    }
    let lower = text.to_lowercase();
    STREET_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Extracts business stubs/details from a map-service result page (§4.H).
/// Pure: the caller (Orchestrator, §4.O) is responsible for scrolling.
pub struct MapParser;

impl MapParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn parse_search_results(&self, html: &str) -> Vec<ListingStub> {
        let doc = Html::parse_document(html);

        let mut cards: Vec<ElementRef> = Vec::new();
        for selector in RESULT_CARD_SELECTORS {
            cards = doc.select(&sel(selector)).collect();
            if !cards.is_empty() {
                break;
            }
        }
        if cards.is_empty() {
            cards = doc.select(&sel("[data-cid]")).collect();
        }

        cards.into_iter().filter_map(|card| self.parse_result_card(card)).collect()
    }

    fn parse_result_card(&self, card: ElementRef) -> Option<ListingStub> {
        let name = self.extract_name(card)?;
        let place_id = card.value().attr("data-cid").map(ToString::to_string);
        let detail_url = card.value().attr("href").map(ToString::to_string).unwrap_or_else(|| "https://www.google.com/maps".to_string());

        let mut stub = ListingStub::new(name, detail_url, Source::Map);
        stub.place_id = place_id;
        stub.raw_address = self.extract_address(card);
        stub.phone = self.extract_phone(card);
        let (has_website, website_url) = self.extract_website(card);
        stub.has_website = has_website;
        stub.website_url = website_url;
        stub.category = self.extract_category(card);
        Some(stub)
    }

    fn extract_name(&self, card: ElementRef) -> Option<String> {
        for selector in NAME_SELECTORS {
            if let Some(elem) = card.select(&sel(selector)).next() {
                let name = clean_text(&text_of(elem));
                if name.chars().count() > 1 {
                    return Some(name);
                }
            }
        }
        card.value().attr("aria-label").map(clean_text).filter(|s| !s.is_empty())
    }

    fn extract_address(&self, card: ElementRef) -> Option<String> {
        for selector in ADDRESS_SELECTORS {
            for elem in card.select(&sel(selector)) {
                let text = text_of(elem);
                if looks_like_address(&text) {
                    return Some(clean_text(&text));
                }
            }
        }
        let full_text = text_of(card);
        PLZ_CITY_RE.captures(&full_text).map(|c| format!("{} {}", &c[1], &c[2]))
    }

    fn extract_phone(&self, card: ElementRef) -> Option<String> {
        if let Some(link) = card.select(&sel("a[href^='tel:']")).next() {
            if let Some(href) = link.value().attr("href") {
                return Some(clean_phone(href.trim_start_matches("tel:")));
            }
        }
        let text = text_of(card);
        TEL_PATTERNS.iter().find_map(|re| re.captures(&text).map(|c| clean_phone(&c[1])))
    }

    fn extract_website(&self, card: ElementRef) -> (bool, Option<String>) {
        for link in card.select(&sel("a[href]")) {
            let Some(href) = link.value().attr("href") else { continue };
            if href.contains("google.com") || href.contains("google.de") {
                continue;
            }
            if href.starts_with("http") && !href.contains("maps") {
                return (true, Some(href.to_string()));
            }
            if let Some(idx) = href.find("url?q=") {
                let candidate = &href[idx + 6..];
                let candidate = candidate.split('&').next().unwrap_or(candidate);
                if let Ok(decoded) = urlencoding::decode(candidate) {
                    if !decoded.contains("google.com") {
                        return (true, Some(decoded.into_owned()));
                    }
                }
            }
        }

        let text = text_of(card).to_lowercase();
        if text.contains("website") || text.contains("webseite") {
            return (true, None);
        }
        (false, None)
    }

    fn extract_category(&self, card: ElementRef) -> Option<String> {
        for selector in CATEGORY_SELECTORS {
            if let Some(elem) = card.select(&sel(selector)).next() {
                let text = clean_text(&text_of(elem));
                if !text.is_empty() && !looks_like_address(&text) && text.chars().count() > 2 && !text.starts_with('€') {
                    return Some(text);
                }
            }
        }
        None
    }

    /// Extracts a `Lead` from a map-service place detail page (§4.H).
    #[must_use]
    pub fn parse_detail_page(&self, html: &str, place_id: Option<&str>) -> Option<Lead> {
        let doc = Html::parse_document(html);

        let name = Self::extract_detail_name(&doc)?;
        let address = Self::extract_detail_address(&doc);
        let phone = Self::extract_detail_phone(&doc);
        let website_url = Self::extract_detail_website(&doc);
        let category = Self::extract_detail_category(&doc).unwrap_or_else(|| "Unbekannt".to_string());

        let mut lead = Lead::new(name, category, address, Source::Map, html_source_url(place_id));
        lead.phone = phone;
        lead.website_url = website_url;
        lead.place_id = place_id.map(ToString::to_string);
        Some(lead)
    }

    fn extract_detail_name(doc: &Html) -> Option<String> {
        if let Some(h1) = doc.select(&sel("h1")).next() {
            return Some(clean_text(&text_of(h1)));
        }
        let title = doc.select(&sel("title")).next()?;
        let text = text_of(title);
        let suffix_re = Regex::new(r"(?i)\s*[-\u{2013}]\s*Google\s*Maps.*$").expect("valid regex");
        Some(clean_text(&suffix_re.replace(&text, "")))
    }

    fn extract_detail_address(doc: &Html) -> Address {
        let button = doc
            .select(&sel("[data-item-id]"))
            .find(|e| e.value().attr("data-item-id").is_some_and(|v| v.to_lowercase().contains("address")));
        let text = button.map(|b| text_of(b)).unwrap_or_else(|| text_of(doc.root_element()));
        if let Some(c) = PLZ_CITY_RE.captures(&text) {
            Address::new(None, None, Some(c[1].to_string()), c[2].trim().to_string(), None)
        } else {
            Address::empty("Unbekannt")
        }
    }

    fn extract_detail_phone(doc: &Html) -> Option<String> {
        if let Some(button) = doc
            .select(&sel("[data-item-id]"))
            .find(|e| e.value().attr("data-item-id").is_some_and(|v| v.to_lowercase().contains("phone")))
        {
            return Some(clean_phone(&text_of(button)));
        }
        doc.select(&sel("a[href^='tel:']"))
            .next()
            .and_then(|e| e.value().attr("href"))
            .map(|h| clean_phone(h.trim_start_matches("tel:")))
    }

    fn extract_detail_website(doc: &Html) -> Option<String> {
        let button = doc
            .select(&sel("[data-item-id]"))
            .find(|e| e.value().attr("data-item-id").is_some_and(|v| v.to_lowercase().contains("authority")))?;
        let link = button.select(&sel("a[href]")).next()?;
        let href = link.value().attr("href")?;
        if let Some(idx) = href.find("url?q=") {
            let candidate = href[idx + 6..].split('&').next().unwrap_or_default();
            return urlencoding::decode(candidate).ok().map(|s| s.into_owned());
        }
        Some(href.to_string())
    }

    fn extract_detail_category(doc: &Html) -> Option<String> {
        doc.select(&sel("button"))
            .find(|e| e.value().attr("jsaction").is_some_and(|v| v.to_lowercase().contains("category")))
            .map(|e| clean_text(&text_of(e)))
    }
}

fn html_source_url(place_id: Option<&str>) -> String {
    match place_id {
        Some(id) => format!("https://www.google.com/maps/place/?q=place_id:{id}"),
        None => "https://www.google.com/maps".to_string(),
    }
}

impl Default for MapParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <div data-result-index="0" data-cid="12345">
            <div class="fontHeadlineSmall">Beispiel Bäckerei</div>
            <span class="W4Efsd">Bäckerei</span>
            <span class="W4Efsd">Musterstr. 1, 12345 Berlin</span>
            <a href="tel:+49301234567">Anrufen</a>
            <a href="https://beispiel-baeckerei.de">Website</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn parses_a_result_card() {
        let stubs = MapParser::new().parse_search_results(SAMPLE);
        assert_eq!(stubs.len(), 1);
        let stub = &stubs[0];
        assert_eq!(stub.name, "Beispiel Bäckerei");
        assert_eq!(stub.place_id.as_deref(), Some("12345"));
        assert!(stub.has_website);
        assert_eq!(stub.website_url.as_deref(), Some("https://beispiel-baeckerei.de"));
    }

    #[test]
    fn no_name_yields_no_stub() {
        let html = r#"<html><body><div data-cid="1"><span class="W4Efsd">12345 Berlin</span></div></body></html>"#;
        let stubs = MapParser::new().parse_search_results(html);
        assert!(stubs.is_empty());
    }
}
