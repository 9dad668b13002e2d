//! Level 3 of the classification cascade (§4.K): HTML GET structural
//! analysis, grounded on the original `html_scanner.py` pattern tables.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlVerdict {
    DefinitelyOld,
    ProbablyOld,
    Unclear,
    ProbablyModern,
    Error,
}

#[derive(Debug, Clone)]
pub struct HtmlAnalysisResult {
    pub verdict: HtmlVerdict,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub detected_cms: Option<String>,
}

fn compile_verdict(
    triples: &[(&'static str, &'static str, HtmlVerdict)],
) -> Vec<(Regex, &'static str, HtmlVerdict)> {
    triples
        .iter()
        .map(|(pat, signal, verdict)| {
            (Regex::new(&format!("(?i){pat}")).expect("valid regex"), *signal, *verdict)
        })
        .collect()
}

fn compile(pairs: &[(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    pairs
        .iter()
        .map(|(pat, signal)| (Regex::new(&format!("(?i){pat}")).expect("valid regex"), *signal))
        .collect()
}

static OLD_CMS: Lazy<Vec<(Regex, &'static str, HtmlVerdict)>> = Lazy::new(|| {
    compile_verdict(&[
        (r"WordPress\s+[1-3]\.", "wordpress_1_3", HtmlVerdict::DefinitelyOld),
        (r"WordPress\s+4\.[0-5]", "wordpress_4_early", HtmlVerdict::ProbablyOld),
        (r"WordPress\s+4\.[6-9]", "wordpress_4_late", HtmlVerdict::ProbablyOld),
        (r"Joomla!\s+1\.", "joomla_1", HtmlVerdict::DefinitelyOld),
        (r"Joomla!\s+2\.", "joomla_2", HtmlVerdict::ProbablyOld),
        (r"Joomla!\s+3\.[0-5]", "joomla_3_early", HtmlVerdict::ProbablyOld),
        (r"Drupal\s+[1-6]", "drupal_old", HtmlVerdict::DefinitelyOld),
        (r"Drupal\s+7", "drupal_7", HtmlVerdict::ProbablyOld),
        (r"TYPO3\s+[1-5]\.", "typo3_old", HtmlVerdict::ProbablyOld),
        (r"TYPO3\s+6\.", "typo3_6", HtmlVerdict::ProbablyOld),
        (r"Contao\s+[1-3]\.", "contao_old", HtmlVerdict::ProbablyOld),
        (r"REDAXO\s+[1-4]\.", "redaxo_old", HtmlVerdict::ProbablyOld),
        (r"Weblication", "weblication", HtmlVerdict::ProbablyOld),
        (r"WebsiteBaker", "websitebaker", HtmlVerdict::ProbablyOld),
        (r"CMSimple", "cmsimple", HtmlVerdict::ProbablyOld),
        (r"phpwcms", "phpwcms", HtmlVerdict::ProbablyOld),
        (r"Microsoft FrontPage", "frontpage", HtmlVerdict::DefinitelyOld),
        (r"Dreamweaver", "dreamweaver", HtmlVerdict::ProbablyOld),
        (r"GoLive", "golive", HtmlVerdict::DefinitelyOld),
        (r"Nvu", "nvu", HtmlVerdict::DefinitelyOld),
        (r"KompoZer", "kompozer", HtmlVerdict::DefinitelyOld),
        (r"Microsoft Word", "ms_word", HtmlVerdict::DefinitelyOld),
    ])
});

static MODERN_CMS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"WordPress\s+[56]\.", "wordpress_modern"),
        (r"Joomla!\s+[45]\.", "joomla_modern"),
        (r"Drupal\s+([89]|10)", "drupal_modern"),
        (r"TYPO3\s+(1[0-3]|[89])\.", "typo3_modern"),
        (r"Shopify", "shopify"),
        (r"Wix\.com", "wix"),
        (r"Squarespace", "squarespace"),
        (r"Webflow", "webflow"),
        (r"Next\.js", "nextjs"),
        (r"Gatsby", "gatsby"),
    ])
});

static OLD_JS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"jquery[.-]1\.[0-9]\.", "jquery_1_x"),
        (r"jquery\.min\.js\?ver=1\.", "jquery_1_x"),
        (r"prototype\.js", "prototype_js"),
        (r"mootools", "mootools"),
        (r"scriptaculous", "scriptaculous"),
        (r"dojo\.js", "dojo_old"),
        (r"yui-min\.js", "yui"),
        (r"swfobject", "swfobject"),
    ])
});

fn sel(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

#[derive(Debug, Default)]
pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes a fetched homepage's HTML (§4.K). `html` is capped to the
    /// first 50k characters for the JS-library scan, mirroring the original's
    /// performance guard.
    #[must_use]
    pub fn analyze(&self, html: &str) -> HtmlAnalysisResult {
        let doc = Html::parse_document(html);
        let mut signals = Vec::new();
        let mut detected_cms = None;

        if let Some((cms_signal, cms)) = self.check_generator(&doc) {
            signals.push(cms_signal);
            detected_cms = Some(cms);
        }

        if !self.has_viewport(&doc) {
            signals.push("no_viewport_meta".to_string());
        }

        signals.extend(self.check_javascript(&doc, html));
        signals.extend(self.check_html_structure(&doc));
        if let Some(doctype) = Self::check_doctype(html) {
            signals.push(doctype);
        }
        signals.extend(self.check_deprecated_tags(&doc));
        signals.extend(self.check_flash(&doc));
        signals.extend(self.check_modern_indicators(&doc, html));

        let (verdict, confidence) = Self::calculate_result(&signals);
        HtmlAnalysisResult { verdict, confidence, signals, detected_cms }
    }

    fn check_generator(&self, doc: &Html) -> Option<(String, String)> {
        let meta_sel = sel("meta[name=generator i]");
        let content = doc.select(&meta_sel).next()?.value().attr("content")?.to_string();

        if let Some((_, signal, _)) = OLD_CMS.iter().find(|(re, ..)| re.is_match(&content)) {
            return Some((format!("cms_{signal}"), (*signal).to_string()));
        }
        if let Some((_, signal)) = MODERN_CMS.iter().find(|(re, _)| re.is_match(&content)) {
            return Some((format!("cms_modern_{signal}"), format!("modern_{signal}")));
        }
        None
    }

    fn has_viewport(&self, doc: &Html) -> bool {
        doc.select(&sel("meta[name=viewport]")).next().is_some()
    }

    fn check_javascript(&self, doc: &Html, html: &str) -> Vec<String> {
        let script_srcs: String = doc
            .select(&sel("script[src]"))
            .filter_map(|el| el.value().attr("src"))
            .collect::<Vec<_>>()
            .join(" ");
        let cap = html.char_indices().nth(50_000).map_or(html.len(), |(i, _)| i);
        let search_text = format!("{script_srcs} {}", &html[..cap]);
        OLD_JS
            .iter()
            .filter(|(re, _)| re.is_match(&search_text))
            .map(|(_, signal)| format!("js_{signal}"))
            .collect()
    }

    fn check_html_structure(&self, doc: &Html) -> Vec<String> {
        let mut signals = Vec::new();
        let table_sel = sel("table");
        let nested = doc.select(&table_sel).filter(|t| t.select(&table_sel).next().is_some()).count();
        if nested >= 2 {
            signals.push("table_layout".to_string());
        }
        let styled = doc.select(&sel("[style]")).count();
        if styled > 50 {
            signals.push("excessive_inline_styles".to_string());
        }
        if doc.select(&sel("frameset")).next().is_some() || doc.select(&sel("frame")).next().is_some() {
            signals.push("frameset".to_string());
        }
        signals
    }

    fn check_doctype(html: &str) -> Option<String> {
        let cap = html.char_indices().nth(500).map_or(html.len(), |(i, _)| i);
        let header = html[..cap].to_lowercase();
        if header.contains("xhtml 1.0 transitional") {
            return Some("doctype_xhtml_transitional".to_string());
        }
        if header.contains("xhtml 1.0 strict") {
            return Some("doctype_xhtml_strict".to_string());
        }
        if header.contains("html 4.01") {
            return Some("doctype_html4".to_string());
        }
        if header.contains("html 3.2") {
            return Some("doctype_html3".to_string());
        }
        if !header.contains("<!doctype") {
            return Some("no_doctype".to_string());
        }
        None
    }

    fn check_deprecated_tags(&self, doc: &Html) -> Vec<String> {
        const TAGS: &[(&str, &str)] = &[
            ("font", "font_tags"),
            ("center", "center_tags"),
            ("marquee", "marquee_tags"),
            ("blink", "blink_tags"),
            ("basefont", "basefont_tags"),
            ("big", "big_tags"),
            ("strike", "strike_tags"),
            ("tt", "tt_tags"),
            ("applet", "applet_tags"),
        ];
        TAGS.iter()
            .filter(|(tag, _)| doc.select(&sel(tag)).next().is_some())
            .map(|(_, signal)| (*signal).to_string())
            .collect()
    }

    fn check_flash(&self, doc: &Html) -> Vec<String> {
        let mut signals = Vec::new();
        for obj in doc.select(&sel("object")) {
            let classid = obj.value().attr("classid").unwrap_or_default().to_lowercase();
            let type_attr = obj.value().attr("type").unwrap_or_default().to_lowercase();
            if classid.contains("flash") || type_attr.contains("flash") || type_attr.contains("shockwave") {
                signals.push("flash_embed".to_string());
                break;
            }
        }
        for embed in doc.select(&sel("embed")) {
            let type_attr = embed.value().attr("type").unwrap_or_default().to_lowercase();
            let src = embed.value().attr("src").unwrap_or_default().to_lowercase();
            if type_attr.contains("flash") || src.contains(".swf") {
                signals.push("flash_embed".to_string());
                break;
            }
        }
        for obj in doc.select(&sel("object")) {
            let classid = obj.value().attr("classid").unwrap_or_default().to_lowercase();
            if classid.contains("clsid:") {
                signals.push("activex_embed".to_string());
                break;
            }
        }
        signals
    }

    fn check_modern_indicators(&self, doc: &Html, html: &str) -> Vec<String> {
        let mut signals = Vec::new();
        if doc.select(&sel("[itemtype*=\"schema.org\" i]")).next().is_some() {
            signals.push("modern_schema_org".to_string());
        }
        if doc
            .select(&sel("meta"))
            .any(|m| m.value().attr("property").is_some_and(|p| p.to_lowercase().starts_with("og:")))
        {
            signals.push("modern_open_graph".to_string());
        }
        if doc
            .select(&sel("meta"))
            .any(|m| m.value().attr("name").is_some_and(|n| n.to_lowercase().starts_with("twitter:")))
        {
            signals.push("modern_twitter_cards".to_string());
        }
        let lower = html.to_lowercase();
        if lower.contains("serviceworker") || lower.contains("service-worker") {
            signals.push("modern_service_worker".to_string());
        }
        let style_content: String = doc.select(&sel("style")).map(|s| s.text().collect::<String>()).collect();
        if style_content.contains("display: flex") || style_content.contains("display: grid") {
            signals.push("modern_css_layout".to_string());
        }
        if doc.select(&sel("#__next")).next().is_some() || doc.select(&sel("#__nuxt")).next().is_some() {
            signals.push("modern_spa_framework".to_string());
        }
        if doc.select(&sel("[data-reactroot]")).next().is_some() {
            signals.push("modern_react".to_string());
        }
        signals
    }

    fn calculate_result(signals: &[String]) -> (HtmlVerdict, f64) {
        let definite_markers = [
            "frontpage", "golive", "nvu", "kompozer", "ms_word", "wordpress_1_3", "joomla_1",
            "drupal_old", "flash_embed", "frameset", "doctype_html3", "doctype_html4", "activex",
        ];
        let probable_markers = [
            "no_viewport", "table_layout", "font_tags", "center_tags", "jquery_1_x", "prototype_js",
            "mootools", "doctype_xhtml", "marquee", "blink", "cms_wordpress_4", "cms_joomla_2",
        ];

        let definite_old = signals.iter().any(|s| definite_markers.iter().any(|m| s.contains(m)));
        let probable_old = signals.iter().filter(|s| probable_markers.iter().any(|m| s.contains(*m))).count();
        let modern = signals.iter().filter(|s| s.contains("modern_")).count();

        if definite_old {
            return (HtmlVerdict::DefinitelyOld, 0.95);
        }
        if probable_old >= 3 {
            return (HtmlVerdict::ProbablyOld, 0.8);
        }
        if probable_old >= 2 {
            return (HtmlVerdict::ProbablyOld, 0.65);
        }
        if probable_old == 1 && modern == 0 {
            return (HtmlVerdict::ProbablyOld, 0.5);
        }
        if modern >= 3 {
            return (HtmlVerdict::ProbablyModern, 0.85);
        }
        if modern >= 1 {
            return (HtmlVerdict::ProbablyModern, 0.6);
        }
        (HtmlVerdict::Unclear, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontpage_editor_is_definitely_old() {
        let html = r#"<html><head><meta name="generator" content="Microsoft FrontPage 4.0"></head><body></body></html>"#;
        let result = HtmlAnalyzer::new().analyze(html);
        assert_eq!(result.verdict, HtmlVerdict::DefinitelyOld);
    }

    #[test]
    fn no_viewport_plus_font_tags_is_probably_old() {
        let html = r#"<html><head></head><body><font>hi</font><center>there</center></body></html>"#;
        let result = HtmlAnalyzer::new().analyze(html);
        assert_eq!(result.verdict, HtmlVerdict::ProbablyOld);
    }

    #[test]
    fn modern_spa_with_viewport_is_modern() {
        let html = r#"<html><head><meta name="viewport" content="width=device-width">
            <meta property="og:title" content="x"><meta name="twitter:card" content="x"></head>
            <body><div id="__next"></div></body></html>"#;
        let result = HtmlAnalyzer::new().analyze(html);
        assert_eq!(result.verdict, HtmlVerdict::ProbablyModern);
    }
}
