//! Listing Parser (§4.F): extracts `ListingStub`s from a directory
//! search-result page, grounded on the original `listing.py`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::model::{ListingStub, Source};
use crate::utils::resolve_relative;

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

static PLZ_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{5})\s+([A-Za-zäöüßÄÖÜ\-]+)").expect("valid regex"));
static STREET_PLZ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([A-Za-zäöüßÄÖÜ.\-]+\s*(?:str\.|straße|weg|platz|allee|gasse)?\s*\d+[a-zA-Z]?)[,\s]+(\d{5})\s+([A-Za-zäöüßÄÖÜ\-]+)",
    )
    .expect("valid regex")
});
static REDIRECT_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]url=([^&]+)").expect("valid regex"));
static PHONE_FALLBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Tel\.?|Telefon)?[:\s]*([\d\s\-/]+\d)").expect("valid regex"));
static RATING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d[,.\d]*)").expect("valid regex"));
static RATING_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((\d+)\)|(\d+)\s*Bewertung").expect("valid regex"));

const ARTICLE_SELECTORS: &[&str] =
    &["article[data-realid]", "article.mod-Treffer", "article.teilnehmer", "div.mod-Treffer", "[data-teilnehmerid]"];

const NAME_SELECTORS: &[&str] = &[
    "h2 a",
    "h2.mod-Treffer__name a",
    "a.mod-Treffer--bestEntryLink",
    "a.gs-name",
    "a[data-wipe-name='Name']",
    ".name a",
    "h2",
    "h3 a",
];

const DETAIL_LINK_SELECTORS: &[&str] = &["a[href*='/gsbiz/']", "a[data-realid]", "a[data-tnid]"];

const PHONE_SELECTORS: &[&str] =
    &["a[href^='tel:']", "span.mod-Treffer__phoneNumber", "[data-wipe-name='Anruf']", ".phone", ".telefon"];

const ADDRESS_SELECTORS: &[&str] = &["address", ".mod-Treffer__address", ".address", ".adresse", "[itemprop='address']"];

const CATEGORY_SELECTORS: &[&str] = &[".mod-Treffer__branchen", ".branchen", ".branche", ".category", "[itemprop='description']"];

const WEBSITE_SELECTORS: &[&str] =
    &["a[data-wipe-name='Website']", "a.mod-Treffer__link--website", "a.website", "a[href*='redirect']"];

const RATING_SELECTORS: &[&str] = &[".mod-Treffer__bewertung", ".bewertung", ".rating", "[itemprop='ratingValue']"];

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn text_of(el: ElementRef) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Extracts a `ListingStub` sequence from a directory search-result page
/// (§4.F). Each listing's `detail_url` is resolved against `base_url`.
pub struct ListingParser {
    base_url: String,
}

impl ListingParser {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    #[must_use]
    pub fn parse(&self, html: &str, source: Source) -> Vec<ListingStub> {
        let doc = Html::parse_document(html);

        let mut articles: Vec<ElementRef> = Vec::new();
        for selector in ARTICLE_SELECTORS {
            articles = doc.select(&sel(selector)).collect();
            if !articles.is_empty() {
                break;
            }
        }
        if articles.is_empty() {
            articles = self.find_articles_fallback(&doc);
        }

        articles.into_iter().filter_map(|article| self.parse_article(article, source)).collect()
    }

    fn find_articles_fallback<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let container_sel = sel("article, div, li");
        let plz_probe = Regex::new(r"\d{5}").expect("valid regex");
        let phone_probe = Regex::new(r"(\d[\d\s\-/]+){6,}").expect("valid regex");

        doc.select(&container_sel)
            .filter(|container| {
                let text = text_of(*container);
                let has_name = NAME_SELECTORS.iter().any(|s| container.select(&sel(s)).next().is_some());
                has_name && (plz_probe.is_match(&text) || phone_probe.is_match(&text))
            })
            .collect()
    }

    fn parse_article(&self, article: ElementRef, source: Source) -> Option<ListingStub> {
        let (name, detail_url) = self.extract_name_and_url(article)?;

        let mut stub = ListingStub::new(name, detail_url, source);
        stub.phone = self.extract_phone(article);
        stub.raw_address = self.extract_address(article);
        stub.category = self.extract_category(article);
        let (has_website, website_url) = self.extract_website(article);
        stub.has_website = has_website;
        stub.website_url = website_url;
        let (rating, rating_count) = self.extract_rating(article);
        stub.rating = rating;
        stub.rating_count = rating_count;
        Some(stub)
    }

    fn extract_name_and_url(&self, article: ElementRef) -> Option<(String, String)> {
        let mut name = None;
        let mut url = None;

        for selector in NAME_SELECTORS {
            let Some(elem) = article.select(&sel(selector)).next() else { continue };
            name = Some(clean_text(&text_of(elem)));
            url = if elem.value().name() == "a" {
                elem.value().attr("href").map(ToString::to_string)
            } else {
                elem.select(&sel("a")).next().and_then(|a| a.value().attr("href")).map(ToString::to_string)
            };
            break;
        }

        if name.is_some() && url.is_none() {
            for selector in DETAIL_LINK_SELECTORS {
                if let Some(link) = article.select(&sel(selector)).next() {
                    if let Some(href) = link.value().attr("href") {
                        if href.contains("/gsbiz/") || (href.starts_with('/') && !href.contains("redirect")) {
                            url = Some(href.to_string());
                            break;
                        }
                    }
                }
            }
        }

        let name = name?;
        let url = url?;
        let detail_url = resolve_relative(&self.base_url, &url).unwrap_or(url);
        Some((name, detail_url))
    }

    fn extract_phone(&self, article: ElementRef) -> Option<String> {
        for selector in PHONE_SELECTORS {
            let Some(elem) = article.select(&sel(selector)).next() else { continue };
            let raw = if elem.value().name() == "a" {
                elem.value().attr("href").and_then(|h| h.strip_prefix("tel:")).map(ToString::to_string)
            } else {
                None
            };
            let text = raw.unwrap_or_else(|| text_of(elem));
            let cleaned: String = text.chars().filter(|c| c.is_ascii_digit() || "+-/() ".contains(*c)).collect();
            let cleaned = cleaned.trim().to_string();
            if cleaned.chars().filter(char::is_ascii_digit).count() >= 6 {
                return Some(cleaned);
            }
        }

        let text = text_of(article);
        let captures = PHONE_FALLBACK_RE.captures(&text)?;
        let phone = captures.get(1)?.as_str().trim().to_string();
        if phone.chars().filter(char::is_ascii_digit).count() >= 6 {
            Some(phone)
        } else {
            None
        }
    }

    fn extract_address(&self, article: ElementRef) -> Option<String> {
        for selector in ADDRESS_SELECTORS {
            if let Some(elem) = article.select(&sel(selector)).next() {
                let address = clean_text(&text_of(elem));
                if !address.is_empty() {
                    return Some(address);
                }
            }
        }

        let text = text_of(article);
        if let Some(c) = STREET_PLZ_RE.captures(&text) {
            return Some(format!("{}, {} {}", &c[1], &c[2], &c[3]));
        }
        if let Some(c) = PLZ_RE.captures(&text) {
            return Some(format!("{} {}", &c[1], &c[2]));
        }
        None
    }

    fn extract_category(&self, article: ElementRef) -> Option<String> {
        CATEGORY_SELECTORS.iter().find_map(|selector| {
            article.select(&sel(selector)).next().map(|e| clean_text(&text_of(e))).filter(|s| !s.is_empty())
        })
    }

    fn extract_website(&self, article: ElementRef) -> (bool, Option<String>) {
        for selector in WEBSITE_SELECTORS {
            if let Some(elem) = article.select(&sel(selector)).next() {
                let href = elem.value().attr("href").unwrap_or_default();
                if href.contains("redirect") || href.contains("url=") {
                    if let Some(c) = REDIRECT_URL_RE.captures(href) {
                        let decoded = urlencoding::decode(&c[1]).map(|s| s.into_owned()).unwrap_or_else(|_| c[1].to_string());
                        return (true, Some(decoded));
                    }
                } else if href.starts_with("http") && !href.contains("gelbeseiten.de") {
                    return (true, Some(href.to_string()));
                }
                return (true, None);
            }
        }

        let text = text_of(article).to_lowercase();
        if text.contains("website") || text.contains("homepage") {
            return (true, None);
        }
        (false, None)
    }

    fn extract_rating(&self, article: ElementRef) -> (Option<f32>, Option<u32>) {
        for selector in RATING_SELECTORS {
            let Some(elem) = article.select(&sel(selector)).next() else { continue };
            let text = text_of(elem);
            let rating = RATING_RE
                .captures(&text)
                .and_then(|c| c[1].replace(',', ".").parse::<f32>().ok())
                .map(|r| r.clamp(0.0, 5.0));
            let count = RATING_COUNT_RE.captures(&text).and_then(|c| {
                c.get(1).or_else(|| c.get(2)).and_then(|m| m.as_str().parse::<u32>().ok())
            });
            if rating.is_some() || count.is_some() {
                return (rating, count);
            }
        }
        (None, None)
    }

    /// Pagination state of a search-result page: `(current, total, has_next)` (§4.F).
    #[must_use]
    pub fn pagination_of(html: &str) -> (u32, u32, bool) {
        let doc = Html::parse_document(html);
        let Some(pagination) = doc.select(&sel(".mod-Pagination, .pagination, nav[aria-label]")).next() else {
            return (1, 1, false);
        };

        let current = pagination
            .select(&sel(".current, .active, [aria-current='page']"))
            .next()
            .and_then(|e| text_of(e).parse::<u32>().ok())
            .unwrap_or(1);

        let mut total = 1;
        for link in pagination.select(&sel("a[href*='seite']")) {
            if let Ok(n) = text_of(link).parse::<u32>() {
                total = total.max(n);
            }
        }

        let has_next = pagination.select(&sel("a[rel='next'], a.next")).next().is_some();
        (current, total, has_next)
    }

    /// Total result count advertised by the page header, if present (§4.F).
    #[must_use]
    pub fn total_results_of(html: &str) -> Option<u32> {
        let doc = Html::parse_document(html);
        let count_re = Regex::new(r"([\d.]+)\s*(?:Treffer|Ergebnisse|Einträge)").expect("valid regex");
        for selector in [".mod-Suche__headline", ".result-count", ".treffer-anzahl"] {
            if let Some(elem) = doc.select(&sel(selector)).next() {
                let text = text_of(elem);
                if let Some(c) = count_re.captures(&text) {
                    if let Ok(n) = c[1].replace('.', "").parse::<u32>() {
                        return Some(n);
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
        <article class="mod-Treffer" data-realid="1">
            <h2 class="mod-Treffer__name"><a href="/gsbiz/beispiel-1">Beispiel GmbH</a></h2>
            <a href="tel:+49301234567">+49 30 1234567</a>
            <address>Musterstr. 1, 12345 Berlin</address>
            <div class="mod-Treffer__branchen">Friseur</div>
            <a class="mod-Treffer__link--website" href="/redirect?url=https%3A%2F%2Fbeispiel.de">Website</a>
        </article>
        </body></html>
    "#;

    #[test]
    fn parses_a_listing_card() {
        let parser = ListingParser::new("https://www.gelbeseiten.de");
        let stubs = parser.parse(SAMPLE, Source::Directory);
        assert_eq!(stubs.len(), 1);
        let stub = &stubs[0];
        assert_eq!(stub.name, "Beispiel GmbH");
        assert_eq!(stub.detail_url, "https://www.gelbeseiten.de/gsbiz/beispiel-1");
        assert_eq!(stub.phone.as_deref(), Some("+49301234567"));
        assert_eq!(stub.raw_address.as_deref(), Some("Musterstr. 1, 12345 Berlin"));
        assert!(stub.has_website);
        assert_eq!(stub.website_url.as_deref(), Some("https://beispiel.de"));
    }

    #[test]
    fn missing_name_yields_no_stub() {
        let parser = ListingParser::new("https://www.gelbeseiten.de");
        let stubs = parser.parse("<html><body><div>nothing here</div></body></html>", Source::Directory);
        assert!(stubs.is_empty());
    }
}
