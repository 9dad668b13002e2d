//! Built-in category list (§6), grounded on the original `config/branchen.py`.
//! Ordered by likelihood of an outdated or absent website, per the original's
//! comment on its own priority ordering.

/// The full category list in its documented priority order.
pub const CATEGORIES: &[&str] = &[
    // Handwerk & Bau
    "Handwerker",
    "Maler",
    "Elektriker",
    "Sanitär",
    "Heizung",
    "Klempner",
    "Dachdecker",
    "Tischler",
    "Schreiner",
    "Fliesenleger",
    "Bodenleger",
    "Maurer",
    "Zimmermann",
    "Glaser",
    "Schlosser",
    "Metallbau",
    "Gartenbau",
    "Landschaftsbau",
    "Gärtner",
    "Bauunternehmen",
    "Trockenbau",
    "Stuckateur",
    "Gerüstbau",
    "Rollladen",
    "Jalousien",
    "Markisen",
    // Gesundheit & Wellness
    "Zahnarzt",
    "Arzt",
    "Hausarzt",
    "Orthopäde",
    "Physiotherapie",
    "Krankengymnastik",
    "Massage",
    "Heilpraktiker",
    "Ergotherapie",
    "Logopädie",
    "Podologe",
    "Fußpflege",
    "Chiropraktiker",
    "Osteopathie",
    "Psychotherapie",
    "Augenarzt",
    "HNO Arzt",
    "Hautarzt",
    "Kinderarzt",
    "Frauenarzt",
    "Tierarzt",
    "Zahntechnik",
    "Pflegedienst",
    "Seniorenbetreuung",
    // Schönheit & Körperpflege
    "Friseur",
    "Kosmetik",
    "Nagelstudio",
    "Kosmetikstudio",
    "Tattoo",
    "Piercing",
    "Sonnenstudio",
    "Barbershop",
    "Beautysalon",
    "Haarentfernung",
    "Permanent Makeup",
    // Gastronomie
    "Restaurant",
    "Gaststätte",
    "Pizzeria",
    "Imbiss",
    "Döner",
    "Asia Restaurant",
    "Italiener",
    "Grieche",
    "Café",
    "Bäckerei",
    "Konditorei",
    "Metzgerei",
    "Fleischerei",
    "Eisdiele",
    "Kneipe",
    "Bar",
    "Biergarten",
    "Catering",
    "Partyservice",
    "Lieferservice",
    // Einzelhandel
    "Blumenladen",
    "Florist",
    "Boutique",
    "Bekleidung",
    "Schuhladen",
    "Schmuck",
    "Uhren",
    "Optiker",
    "Hörgeräte",
    "Sanitätshaus",
    "Apotheke",
    "Reformhaus",
    "Bioladen",
    "Weinhandlung",
    "Getränkemarkt",
    "Tabak",
    "Kiosk",
    "Schreibwaren",
    "Spielwaren",
    "Elektrogeräte",
    "Haushaltsgeräte",
    "Möbel",
    "Küchen",
    "Raumausstatter",
    "Gardinen",
    "Teppiche",
    "Lampen",
    "Antiquitäten",
    "Second Hand",
    "Tierhandlung",
    "Zoofachhandel",
    "Angelbedarf",
    "Sportgeschäft",
    "Fahrradladen",
    "Musikinstrumente",
    "Bürobedarf",
    "Druckerei",
    "Copyshop",
    // Auto & Mobilität
    "Autowerkstatt",
    "KFZ Werkstatt",
    "Reifenservice",
    "Autolackierung",
    "Autoaufbereitung",
    "Autopflege",
    "Autohaus",
    "Autovermietung",
    "Fahrschule",
    "Abschleppdienst",
    "Motorrad",
    "Tankstelle",
    // Dienstleistungen
    "Schlüsseldienst",
    "Reinigung",
    "Gebäudereinigung",
    "Hausmeisterservice",
    "Umzug",
    "Entrümpelung",
    "Schädlingsbekämpfung",
    "Kammerjäger",
    "Wäscherei",
    "Änderungsschneiderei",
    "Schneider",
    "Schuhmacher",
    "Polsterei",
    "Reparaturservice",
    "Handy Reparatur",
    "Computer Reparatur",
    // Beratung & Büro
    "Steuerberater",
    "Rechtsanwalt",
    "Notar",
    "Wirtschaftsprüfer",
    "Unternehmensberatung",
    "Versicherung",
    "Finanzberater",
    "Immobilienmakler",
    "Hausverwaltung",
    "Buchhalter",
    "Übersetzer",
    "Dolmetscher",
    "Detektei",
    // Kreativ & Medien
    "Fotograf",
    "Videoproduktion",
    "Grafikdesign",
    "Werbeagentur",
    "Schilder",
    "Beschriftung",
    "Eventplanung",
    "DJ",
    "Musiker",
    "Künstler",
    // Bau & Architektur
    "Architekt",
    "Bauingenieur",
    "Statiker",
    "Vermessung",
    "Energieberater",
    "Sachverständiger",
    "Gutachter",
    // Bildung & Betreuung
    "Nachhilfe",
    "Musikschule",
    "Tanzschule",
    "Sprachschule",
    "Kindergarten",
    "Tagesmutter",
    "Kinderbetreuung",
    // Freizeit & Sport
    "Fitnessstudio",
    "Yoga",
    "Kampfsport",
    "Tanzstudio",
    "Reiterhof",
    "Schwimmschule",
    "Golfclub",
    "Tennisclub",
    "Bowling",
    "Billard",
    "Escape Room",
    "Spielhalle",
    // Haus & Garten
    "Gartenpflege",
    "Baumfällung",
    "Winterdienst",
    "Poolbau",
    "Zaunbau",
    "Terrassenbau",
    "Pflasterarbeiten",
    "Brunnen",
    // Technik & IT
    "Computer Service",
    "IT Service",
    "Telefonanlagen",
    "Alarmanlagen",
    "Videoüberwachung",
    "Elektrotechnik",
    "Antenne Satellit",
    // Sonstiges
    "Hotel",
    "Pension",
    "Ferienwohnung",
    "Campingplatz",
    "Bestattung",
    "Steinmetz",
    "Goldschmied",
    "Gravur",
    "Stempel",
    "Textildruck",
    "Werbemittel",
];

/// Curated tag -> category-subset mapping for `--kategorie <tag>` runs.
pub const CATEGORY_TAGS: &[(&str, &[&str])] = &[
    (
        "handwerk",
        &[
            "Handwerker", "Maler", "Elektriker", "Sanitär", "Heizung", "Dachdecker", "Tischler", "Fliesenleger",
            "Maurer", "Glaser", "Schlosser", "Gartenbau", "Trockenbau",
        ],
    ),
    (
        "gesundheit",
        &[
            "Zahnarzt", "Arzt", "Physiotherapie", "Massage", "Heilpraktiker", "Podologe", "Ergotherapie", "Logopädie",
            "Tierarzt",
        ],
    ),
    ("beauty", &["Friseur", "Kosmetik", "Nagelstudio", "Tattoo", "Barbershop"]),
    (
        "gastro",
        &["Restaurant", "Pizzeria", "Imbiss", "Café", "Bäckerei", "Metzgerei", "Bar", "Catering"],
    ),
    (
        "auto",
        &["Autowerkstatt", "KFZ Werkstatt", "Reifenservice", "Autohaus", "Fahrschule", "Autolackierung"],
    ),
    (
        "beratung",
        &["Steuerberater", "Rechtsanwalt", "Versicherung", "Immobilienmakler", "Finanzberater"],
    ),
];

/// Resolves `tag` (case-insensitive) to its curated category subset, or
/// returns the full list when no tag matches.
#[must_use]
pub fn categories_for_tag(tag: Option<&str>) -> &'static [&'static str] {
    let Some(tag) = tag else { return CATEGORIES };
    let tag_lower = tag.to_lowercase();
    CATEGORY_TAGS.iter().find(|(name, _)| *name == tag_lower).map_or(CATEGORIES, |(_, categories)| categories)
}

/// Names of every curated tag, for `--list-kategorien`-style output.
#[must_use]
pub fn tag_names() -> Vec<&'static str> {
    CATEGORY_TAGS.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_list_is_non_trivial() {
        assert!(CATEGORIES.len() > 200);
    }

    #[test]
    fn tag_lookup_is_case_insensitive() {
        let subset = categories_for_tag(Some("BEAUTY"));
        assert_eq!(subset, categories_for_tag(Some("beauty")));
        assert!(subset.contains(&"Friseur"));
    }

    #[test]
    fn unknown_tag_falls_back_to_full_list() {
        assert_eq!(categories_for_tag(Some("nonexistent")), CATEGORIES);
    }

    #[test]
    fn no_tag_returns_full_list() {
        assert_eq!(categories_for_tag(None), CATEGORIES);
    }
}
