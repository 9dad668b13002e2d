//! Fuzzy matching utilities for lead deduplication (§4.M), grounded on the
//! original `matching.py`: phone/name/address normalization plus a weighted
//! Levenshtein-ratio fusion score.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Lead, Source};

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));
static LEGAL_FORM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(gmbh|mbh|ag|kg|ohg|eg|e\.?k\.?|inh\.?|gbr|partg|partner|gesellschaft|company|co\.?)\b")
        .expect("valid regex")
});
static AMPERSAND_CO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&\s*co\.?").expect("valid regex"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static STR_ABBR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bstr\.?\b").expect("valid regex"));

/// Strips formatting and country/trunk prefixes, leaving bare digits.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let digits = NON_DIGIT_RE.replace_all(phone, "").to_string();
    let digits = if digits.starts_with("0049") && digits.len() >= 12 {
        digits[4..].to_string()
    } else if digits.starts_with("49") && digits.len() >= 10 {
        digits[2..].to_string()
    } else {
        digits
    };
    if let Some(stripped) = digits.strip_prefix('0') {
        stripped.to_string()
    } else {
        digits
    }
}

fn fold_umlauts(s: &str) -> String {
    s.replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
        .replace('ß', "ss")
}

/// Lowercases, folds umlauts, strips legal-form suffixes and punctuation.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let name = fold_umlauts(&name.to_lowercase());
    let name = AMPERSAND_CO_RE.replace_all(&name, "");
    let name = LEGAL_FORM_RE.replace_all(&name, "");
    let name = NON_WORD_RE.replace_all(&name, "");
    let name = MULTI_SPACE_RE.replace_all(&name, " ");
    name.trim().to_string()
}

/// Lowercases, folds umlauts, normalizes street abbreviations and punctuation.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    let address = fold_umlauts(&address.to_lowercase());
    let address = STR_ABBR_RE.replace_all(&address, "strasse");
    let address = NON_WORD_RE.replace_all(&address, "");
    let address = MULTI_SPACE_RE.replace_all(&address, " ");
    address.trim().to_string()
}

#[must_use]
pub fn similarity_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

#[must_use]
pub fn is_phone_match(phone1: Option<&str>, phone2: Option<&str>) -> (bool, f64) {
    let (Some(phone1), Some(phone2)) = (phone1, phone2) else {
        return (false, 0.0);
    };
    let norm1 = normalize_phone(phone1);
    let norm2 = normalize_phone(phone2);
    if norm1.is_empty() || norm2.is_empty() {
        return (false, 0.0);
    }
    if norm1 == norm2 {
        return (true, 1.0);
    }
    if (norm1.contains(&norm2) || norm2.contains(&norm1)) && norm1.len().min(norm2.len()) >= 6 {
        return (true, 0.9);
    }
    let similarity = similarity_score(&norm1, &norm2);
    if similarity >= 0.9 {
        return (true, similarity);
    }
    (false, similarity)
}

#[must_use]
pub fn is_name_match(name1: Option<&str>, name2: Option<&str>, threshold: f64) -> (bool, f64) {
    let (Some(name1), Some(name2)) = (name1, name2) else {
        return (false, 0.0);
    };
    let norm1 = normalize_name(name1);
    let norm2 = normalize_name(name2);
    if norm1.is_empty() || norm2.is_empty() {
        return (false, 0.0);
    }
    if norm1 == norm2 {
        return (true, 1.0);
    }
    let similarity = similarity_score(&norm1, &norm2);
    if similarity >= threshold {
        return (true, similarity);
    }
    if norm1.len() > 3 && norm2.len() > 3 && (norm1.contains(&norm2) || norm2.contains(&norm1)) {
        return (true, 0.85);
    }
    (false, similarity)
}

#[must_use]
pub fn is_address_match(
    addr1: Option<&str>,
    plz1: Option<&str>,
    addr2: Option<&str>,
    plz2: Option<&str>,
    threshold: f64,
) -> (bool, f64) {
    let plz_match = match (plz1, plz2) {
        (Some(p1), Some(p2)) => {
            let c1 = NON_DIGIT_RE.replace_all(p1, "");
            let c2 = NON_DIGIT_RE.replace_all(p2, "");
            c1 == c2
        }
        _ => false,
    };

    if plz1.is_some() && plz2.is_some() && !plz_match {
        return (false, 0.0);
    }

    let (Some(addr1), Some(addr2)) = (addr1, addr2) else {
        return if plz_match { (true, 0.7) } else { (false, 0.0) };
    };

    let norm1 = normalize_address(addr1);
    let norm2 = normalize_address(addr2);
    if norm1.is_empty() || norm2.is_empty() {
        return if plz_match { (true, 0.7) } else { (false, 0.0) };
    }

    let similarity = similarity_score(&norm1, &norm2);
    if plz_match && similarity >= 0.5 {
        return (true, (similarity + 0.3).min(1.0));
    }
    if similarity >= threshold {
        return (true, similarity);
    }
    (false, similarity)
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub is_match: bool,
    pub confidence: f64,
    pub match_reasons: Vec<String>,
    pub mismatch_reasons: Vec<String>,
}

/// Three-tier duplicate test: exact phone short-circuits, otherwise name/address
/// scores are weighted and fused (§4.M).
#[must_use]
pub fn is_duplicate(
    lead_a: &Lead,
    lead_b: &Lead,
    phone_weight: f64,
    name_weight: f64,
    address_weight: f64,
    threshold: f64,
) -> MatchResult {
    let mut match_reasons = Vec::new();
    let mut mismatch_reasons = Vec::new();
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    if let (Some(p_a), Some(p_b)) = (lead_a.phone.as_deref(), lead_b.phone.as_deref()) {
        let (phone_match, phone_conf) = is_phone_match(Some(p_a), Some(p_b));
        if phone_match && phone_conf >= 0.95 {
            return MatchResult {
                is_match: true,
                confidence: phone_conf,
                match_reasons: vec!["phone_exact".to_string()],
                mismatch_reasons: Vec::new(),
            };
        } else if phone_match {
            match_reasons.push(format!("phone ({phone_conf:.2})"));
            total_score += phone_conf * phone_weight;
        } else {
            mismatch_reasons.push("phone".to_string());
        }
        total_weight += phone_weight;
    }

    let (name_match, name_conf) = is_name_match(Some(&lead_a.name), Some(&lead_b.name), 0.85);
    if name_match {
        match_reasons.push(format!("name ({name_conf:.2})"));
        total_score += name_conf * name_weight;
    } else {
        mismatch_reasons.push("name".to_string());
    }
    total_weight += name_weight;

    let addr_a = lead_a.address.format_full();
    let addr_b = lead_b.address.format_full();
    let plz_a = lead_a.address.postal_code.as_deref();
    let plz_b = lead_b.address.postal_code.as_deref();

    if !addr_a.is_empty() || !addr_b.is_empty() || plz_a.is_some() || plz_b.is_some() {
        let (addr_match, addr_conf) = is_address_match(
            Some(addr_a.as_str()).filter(|s| !s.is_empty()),
            plz_a,
            Some(addr_b.as_str()).filter(|s| !s.is_empty()),
            plz_b,
            0.8,
        );
        if addr_match {
            match_reasons.push(format!("address ({addr_conf:.2})"));
            total_score += addr_conf * address_weight;
        } else {
            mismatch_reasons.push("address".to_string());
        }
        total_weight += address_weight;
    }

    let mut confidence = if total_weight > 0.0 { total_score / total_weight } else { 0.0 };

    if name_match {
        if let (Some(p_a), Some(p_b)) = (plz_a, plz_b) {
            if p_a == p_b {
                confidence = confidence.max(0.9);
                if !match_reasons.iter().any(|r| r.contains("plz")) {
                    match_reasons.push("plz_exact".to_string());
                }
            }
        }
    }

    MatchResult {
        is_match: confidence >= threshold,
        confidence,
        match_reasons,
        mismatch_reasons,
    }
}

/// Merges `secondary` into `primary`, `primary` winning every populated field
/// (§4.M merge strategy: directory leads are primary, map leads supplement).
#[must_use]
pub fn merge_leads(mut primary: Lead, secondary: Lead) -> Lead {
    if primary.phone.is_none() {
        primary.phone = secondary.phone;
    }
    if primary.email.is_none() {
        primary.email = secondary.email;
    }
    if primary.website_url.is_none() {
        primary.website_url = secondary.website_url;
    }
    if primary.opening_hours.is_none() {
        primary.opening_hours = secondary.opening_hours;
    }
    if primary.rating.is_none() && secondary.rating.is_some() {
        primary.rating = secondary.rating;
        primary.rating_count = secondary.rating_count;
    }
    if primary.address.street.is_none() {
        primary.address.street = secondary.address.street;
    }
    if primary.address.house_number.is_none() {
        primary.address.house_number = secondary.address.house_number;
    }
    if primary.address.postal_code.is_none() {
        primary.address.postal_code = secondary.address.postal_code;
    }
    if primary.place_id.is_none() {
        primary.place_id = secondary.place_id;
    }
    if primary.directory_id.is_none() {
        primary.directory_id = secondary.directory_id;
    }
    for url in secondary.source_urls {
        if !primary.source_urls.contains(&url) {
            primary.source_urls.push(url);
        }
    }
    primary.sources.extend(secondary.sources);
    primary
}

#[must_use]
pub fn default_source_label(source: Source) -> &'static str {
    source.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_phone_strips_country_code_and_trunk_zero() {
        assert_eq!(normalize_phone("+49 (0)30 123456"), "30123456");
        assert_eq!(normalize_phone("030 123456"), "30123456");
    }

    #[test]
    fn normalize_name_strips_legal_form() {
        assert_eq!(normalize_name("Müller & Co. GmbH"), "mueller");
    }

    #[test]
    fn phone_exact_match_short_circuits() {
        let (is_match, confidence) = is_phone_match(Some("030 123456"), Some("+49 30 123456"));
        assert!(is_match);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn name_substring_match_with_min_length() {
        let (is_match, confidence) = is_name_match(Some("Bäckerei Schmidt"), Some("Schmidt"), 0.85);
        assert!(is_match);
        assert!(confidence >= 0.85);
    }

    #[test]
    fn address_match_boosted_by_matching_postal_code() {
        let (is_match, confidence) =
            is_address_match(Some("Hauptstr. 1"), Some("10115"), Some("Hauptstrasse 1"), Some("10115"), 0.8);
        assert!(is_match);
        assert!(confidence > 0.9);
    }
}
