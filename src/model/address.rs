//! Address (§3): immutable after construction, postal code validated.

use serde::{Deserialize, Serialize};

/// A street address. Construction validates the postal code but never
/// rejects the record for it — a non-validating code is retained raw and
/// flagged via `plz_canonical`, per SPEC_FULL §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
    /// Whether `postal_code` passed the five-digit validation.
    pub plz_canonical: bool,
    pub city: String,
    pub region: Option<String>,
}

impl Address {
    #[must_use]
    pub fn new(
        street: Option<String>,
        house_number: Option<String>,
        postal_code: Option<String>,
        city: String,
        region: Option<String>,
    ) -> Self {
        let (postal_code, plz_canonical) = match postal_code {
            Some(raw) => {
                let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
                if digits.len() == 5 {
                    (Some(digits), true)
                } else {
                    (Some(raw), false)
                }
            }
            None => (None, true),
        };
        Self {
            street,
            house_number,
            postal_code,
            plz_canonical,
            city,
            region,
        }
    }

    #[must_use]
    pub fn empty(city: impl Into<String>) -> Self {
        Self::new(None, None, None, city.into(), None)
    }

    /// True when street, house number, postal code and city are all present.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.street.is_some()
            && self.house_number.is_some()
            && self.postal_code.is_some()
            && !self.city.is_empty()
    }

    /// True when at least postal code and city are present.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.postal_code.is_some() && !self.city.is_empty()
    }

    /// Renders a single-line formatted address string, e.g.
    /// "Musterstr. 1, 12345 Berlin".
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut parts = Vec::new();
        match (&self.street, &self.house_number) {
            (Some(street), Some(number)) => parts.push(format!("{street} {number}")),
            (Some(street), None) => parts.push(street.clone()),
            _ => {}
        }
        let mut locality = String::new();
        if let Some(plz) = &self.postal_code {
            locality.push_str(plz);
            locality.push(' ');
        }
        locality.push_str(&self.city);
        if !locality.trim().is_empty() {
            parts.push(locality);
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_five_digit_plz() {
        let addr = Address::new(None, None, Some("10115".into()), "Berlin".into(), None);
        assert!(addr.plz_canonical);
    }

    #[test]
    fn flags_non_canonical_plz_but_retains_raw() {
        let addr = Address::new(None, None, Some("abc".into()), "Berlin".into(), None);
        assert!(!addr.plz_canonical);
        assert_eq!(addr.postal_code.as_deref(), Some("abc"));
    }

    #[test]
    fn formats_full_address() {
        let addr = Address::new(
            Some("Musterstr.".into()),
            Some("1".into()),
            Some("12345".into()),
            "Berlin".into(),
            None,
        );
        assert_eq!(addr.format_full(), "Musterstr. 1, 12345 Berlin");
    }
}
