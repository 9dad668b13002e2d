//! Level 2 of the classification cascade (§4.J): HTTP HEAD header analysis,
//! grounded on the original `header_check.py` pattern tables.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVerdict {
    DefinitelyOld,
    ProbablyOld,
    Unclear,
    ProbablyModern,
    Error,
}

#[derive(Debug, Clone)]
pub struct HeaderAnalysisResult {
    pub verdict: HeaderVerdict,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub server: Option<String>,
    pub powered_by: Option<String>,
}

fn compile(pairs: &[(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    pairs
        .iter()
        .map(|(pat, signal)| (Regex::new(&format!("(?i){pat}")).expect("valid regex"), *signal))
        .collect()
}

fn compile_verdict(
    triples: &[(&'static str, &'static str, HeaderVerdict)],
) -> Vec<(Regex, &'static str, HeaderVerdict)> {
    triples
        .iter()
        .map(|(pat, signal, verdict)| {
            (Regex::new(&format!("(?i){pat}")).expect("valid regex"), *signal, *verdict)
        })
        .collect()
}

static OLD_SERVER: Lazy<Vec<(Regex, &'static str, HeaderVerdict)>> = Lazy::new(|| {
    compile_verdict(&[
        (r"Apache/1\.", "apache_1_x", HeaderVerdict::DefinitelyOld),
        (r"Apache/2\.0", "apache_2_0", HeaderVerdict::ProbablyOld),
        (r"Apache/2\.2", "apache_2_2", HeaderVerdict::ProbablyOld),
        (r"Microsoft-IIS/[1-5]\.", "iis_old", HeaderVerdict::DefinitelyOld),
        (r"Microsoft-IIS/6\.", "iis_6", HeaderVerdict::DefinitelyOld),
        (r"Microsoft-IIS/7\.", "iis_7", HeaderVerdict::ProbablyOld),
        (r"nginx/0\.", "nginx_0_x", HeaderVerdict::DefinitelyOld),
        (r"nginx/1\.[0-9]\.?[0-9]?$", "nginx_1_early", HeaderVerdict::ProbablyOld),
        (r"lighttpd/1\.[0-3]", "lighttpd_old", HeaderVerdict::ProbablyOld),
        (r"Zeus", "zeus_server", HeaderVerdict::DefinitelyOld),
        (r"Netscape", "netscape_server", HeaderVerdict::DefinitelyOld),
        (r"Oracle-HTTP-Server", "oracle_http", HeaderVerdict::ProbablyOld),
    ])
});

static OLD_POWERED_BY: Lazy<Vec<(Regex, &'static str, HeaderVerdict)>> = Lazy::new(|| {
    compile_verdict(&[
        (r"PHP/[1-4]\.", "php_1_4", HeaderVerdict::DefinitelyOld),
        (r"PHP/5\.[0-3]", "php_5_early", HeaderVerdict::DefinitelyOld),
        (r"PHP/5\.[4-6]", "php_5_late", HeaderVerdict::ProbablyOld),
        (r"ASP\.NET/[1-2]\.", "asp_net_old", HeaderVerdict::ProbablyOld),
        (r"ASP\.NET/3\.", "asp_net_3", HeaderVerdict::ProbablyOld),
        (r"Perl", "perl_cgi", HeaderVerdict::ProbablyOld),
        (r"mod_perl", "mod_perl", HeaderVerdict::ProbablyOld),
        (r"ColdFusion", "coldfusion", HeaderVerdict::ProbablyOld),
    ])
});

static MODERN_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"nginx/1\.(1[89]|2[0-9])", "nginx_modern"),
        (r"Apache/2\.4", "apache_2_4"),
        (r"cloudflare", "cloudflare"),
        (r"Vercel", "vercel"),
        (r"Netlify", "netlify"),
        (r"PHP/[78]\.", "php_modern"),
        (r"Express", "expressjs"),
        (r"Next\.js", "nextjs"),
        (r"gunicorn", "gunicorn"),
        (r"uvicorn", "uvicorn"),
    ])
});

const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-content-type-options",
    "x-frame-options",
    "x-xss-protection",
    "referrer-policy",
    "permissions-policy",
];

#[derive(Debug, Default)]
pub struct HeaderAnalyzer;

impl HeaderAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes a lower-cased header map from a HEAD response (§4.J).
    #[must_use]
    pub fn analyze(&self, headers: &BTreeMap<String, String>) -> HeaderAnalysisResult {
        let mut signals = Vec::new();

        let server = headers.get("server").cloned().filter(|s| !s.is_empty());
        if let Some(server) = &server {
            if let Some((_, signal, _)) = OLD_SERVER.iter().find(|(re, ..)| re.is_match(server)) {
                signals.push(format!("server_{signal}"));
            }
        }

        let powered_by = headers.get("x-powered-by").cloned().filter(|s| !s.is_empty());
        if let Some(powered_by) = &powered_by {
            if let Some((_, signal, _)) = OLD_POWERED_BY.iter().find(|(re, ..)| re.is_match(powered_by)) {
                signals.push(format!("powered_by_{signal}"));
            }
        }

        let security_score = SECURITY_HEADERS.iter().filter(|h| headers.contains_key(**h)).count();
        if security_score == 0 {
            signals.push("keine_security_header".to_string());
        } else if security_score >= 4 {
            signals.push("gute_security_header".to_string());
        }

        for (re, signal) in MODERN_PATTERNS.iter() {
            if server.as_deref().is_some_and(|s| re.is_match(s)) {
                signals.push(format!("modern_{signal}"));
            }
            if powered_by.as_deref().is_some_and(|s| re.is_match(s)) {
                signals.push(format!("modern_{signal}"));
            }
        }
        if headers.contains_key("cf-ray") || headers.contains_key("cf-cache-status") {
            signals.push("modern_cloudflare".to_string());
        }
        if headers.contains_key("x-vercel-id") {
            signals.push("modern_vercel".to_string());
        }
        if headers.contains_key("x-nf-request-id") {
            signals.push("modern_netlify".to_string());
        }
        if headers.keys().any(|k| k.starts_with("x-amz-")) {
            signals.push("modern_aws".to_string());
        }

        if !headers.contains_key("cache-control") {
            signals.push("kein_cache_control".to_string());
        }
        if headers.get("pragma").map(String::as_str) == Some("no-cache") {
            signals.push("pragma_no_cache".to_string());
        }
        if let Some(ct) = headers.get("content-type") {
            if ct.contains("text/html") && !ct.contains("charset") {
                signals.push("html_ohne_charset".to_string());
            }
        }
        if let Some(version) = headers.get("x-aspnet-version") {
            if Regex::new(r"^[1-3]\.").expect("valid regex").is_match(version) {
                signals.push("aspnet_version_alt".to_string());
            }
        }
        if headers.contains_key("x-powered-by-plesk") {
            signals.push("plesk_header".to_string());
        }

        let (verdict, confidence) = Self::calculate_result(&signals, security_score);

        HeaderAnalysisResult { verdict, confidence, signals, server, powered_by }
    }

    fn calculate_result(signals: &[String], security_score: usize) -> (HeaderVerdict, f64) {
        let old_markers = ["alt", "old", "php_1", "php_5", "apache_2_0", "apache_2_2", "iis_"];
        let old_signals: Vec<&String> =
            signals.iter().filter(|s| old_markers.iter().any(|m| s.contains(m))).collect();
        let modern_signals: Vec<&String> = signals.iter().filter(|s| s.contains("modern_")).collect();

        let definite_markers = ["php_1_4", "php_5_early", "apache_1", "iis_old", "iis_6"];
        let definite_old = signals.iter().any(|s| definite_markers.iter().any(|m| s.contains(m)));

        if definite_old {
            return (HeaderVerdict::DefinitelyOld, 0.9);
        }
        if old_signals.len() >= 2 || (old_signals.len() >= 1 && security_score == 0) {
            return (HeaderVerdict::ProbablyOld, 0.7);
        }
        if old_signals.len() == 1 {
            return (HeaderVerdict::ProbablyOld, 0.5);
        }
        if !modern_signals.is_empty() && security_score >= 3 {
            return (HeaderVerdict::ProbablyModern, 0.8);
        }
        if !modern_signals.is_empty() {
            return (HeaderVerdict::ProbablyModern, 0.6);
        }
        if security_score >= 4 {
            return (HeaderVerdict::ProbablyModern, 0.5);
        }
        (HeaderVerdict::Unclear, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn old_apache_with_no_security_headers_is_old() {
        let result = HeaderAnalyzer::new().analyze(&headers(&[("server", "Apache/2.2.15")]));
        assert_eq!(result.verdict, HeaderVerdict::ProbablyOld);
    }

    #[test]
    fn cloudflare_with_security_headers_is_modern() {
        let result = HeaderAnalyzer::new().analyze(&headers(&[
            ("server", "cloudflare"),
            ("strict-transport-security", "max-age=31536000"),
            ("content-security-policy", "default-src 'self'"),
            ("x-frame-options", "DENY"),
        ]));
        assert_eq!(result.verdict, HeaderVerdict::ProbablyModern);
    }

    #[test]
    fn ancient_php_is_definitely_old() {
        let result = HeaderAnalyzer::new().analyze(&headers(&[("x-powered-by", "PHP/4.4.9")]));
        assert_eq!(result.verdict, HeaderVerdict::DefinitelyOld);
    }
}
