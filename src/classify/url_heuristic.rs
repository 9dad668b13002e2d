//! Level 1 of the classification cascade (§4.I): instant, no network call,
//! grounded on the original `url_heuristic.py` pattern tables.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlVerdict {
    DefinitelyOld,
    ProbablyOld,
    Unclear,
    ProbablyModern,
    Baukasten,
}

#[derive(Debug, Clone)]
pub struct UrlAnalysisResult {
    pub verdict: UrlVerdict,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub domain: String,
    pub is_https: bool,
}

struct Pattern {
    re: Regex,
    signal: &'static str,
    verdict: UrlVerdict,
}

fn old_hosting_patterns() -> &'static [(&'static str, &'static str, UrlVerdict)] {
    &[
        (r"\.geocities\.", "geocities_hosting", UrlVerdict::DefinitelyOld),
        (r"\.tripod\.", "tripod_hosting", UrlVerdict::DefinitelyOld),
        (r"\.angelfire\.", "angelfire_hosting", UrlVerdict::DefinitelyOld),
        (r"\.fortunecity\.", "fortunecity_hosting", UrlVerdict::DefinitelyOld),
        (r"\.homestead\.", "homestead_hosting", UrlVerdict::DefinitelyOld),
        (r"\.bplaced\.", "bplaced_hosting", UrlVerdict::ProbablyOld),
        (r"\.beepworld\.", "beepworld_hosting", UrlVerdict::DefinitelyOld),
        (r"\.de\.vu$", "de_vu_domain", UrlVerdict::DefinitelyOld),
        (r"\.de\.to$", "de_to_domain", UrlVerdict::DefinitelyOld),
        (r"\.co\.de$", "co_de_domain", UrlVerdict::ProbablyOld),
        (r"\.funpic\.", "funpic_hosting", UrlVerdict::DefinitelyOld),
        (r"\.ohost\.", "ohost_hosting", UrlVerdict::ProbablyOld),
        (r"\.cwsurf\.", "cwsurf_hosting", UrlVerdict::DefinitelyOld),
        (r"\.t-online\.de/home/", "t_online_home", UrlVerdict::DefinitelyOld),
        (r"home\.t-online\.de", "t_online_home", UrlVerdict::DefinitelyOld),
        (r"\.arcor\.de/", "arcor_home", UrlVerdict::ProbablyOld),
        (r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}", "ip_based_url", UrlVerdict::ProbablyOld),
    ]
}

static BAUKASTEN_PATTERNS: &[(&str, &str)] = &[
    (r"\.jimdo\.com", "jimdo_baukasten"),
    (r"\.jimdofree\.com", "jimdo_free"),
    (r"\.jimdosite\.com", "jimdo_site"),
    (r"\.wixsite\.com", "wix_baukasten"),
    (r"\.wix\.com", "wix_baukasten"),
    (r"\.weebly\.com", "weebly_baukasten"),
    (r"\.squarespace\.com", "squarespace_baukasten"),
    (r"\.webnode\.", "webnode_baukasten"),
    (r"\.site123\.", "site123_baukasten"),
    (r"\.strikingly\.com", "strikingly_baukasten"),
    (r"\.wordpress\.com", "wordpress_com_free"),
    (r"\.blogspot\.", "blogspot"),
    (r"\.blogger\.com", "blogger"),
    (r"\.tumblr\.com", "tumblr"),
    (r"\.one\.com", "one_com"),
    (r"\.my-free-website\.", "my_free_website"),
];

static MODERN_PATTERNS: &[(&str, &str)] = &[
    (r"\.vercel\.app", "vercel_hosting"),
    (r"\.netlify\.app", "netlify_hosting"),
    (r"\.github\.io", "github_pages"),
    (r"\.pages\.dev", "cloudflare_pages"),
    (r"\.herokuapp\.com", "heroku_hosting"),
    (r"\.azurewebsites\.net", "azure_hosting"),
    (r"\.web\.app", "firebase_hosting"),
    (r"\.firebaseapp\.com", "firebase_hosting"),
];

static SUSPICIOUS_PATH_PATTERNS: &[(&str, &str)] = &[
    (r"/~\w+", "tilde_user_path"),
    (r"/home/\w+", "home_user_path"),
    (r"/users?/\w+", "users_path"),
    (r"/members?/\w+", "members_path"),
    (r"\.htm$", "htm_extension"),
    (r"/cgi-bin/", "cgi_bin_path"),
    (r"\.php3$", "php3_extension"),
    (r"\.asp$", "asp_classic"),
    (r"/default\.aspx?$", "default_aspx"),
];

static OLD_HOSTING: Lazy<Vec<Pattern>> = Lazy::new(|| {
    old_hosting_patterns()
        .iter()
        .map(|(pat, signal, verdict)| Pattern {
            re: Regex::new(&format!("(?i){pat}")).expect("valid regex"),
            signal,
            verdict: *verdict,
        })
        .collect()
});

fn compile_pairs(pairs: &'static [(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    pairs
        .iter()
        .map(|(pat, signal)| (Regex::new(&format!("(?i){pat}")).expect("valid regex"), *signal))
        .collect()
}

static BAUKASTEN: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| compile_pairs(BAUKASTEN_PATTERNS));
static MODERN: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| compile_pairs(MODERN_PATTERNS));
static SUSPICIOUS_PATH: Lazy<Vec<(Regex, &'static str)>> =
    Lazy::new(|| compile_pairs(SUSPICIOUS_PATH_PATTERNS));

#[derive(Debug, Default)]
pub struct UrlHeuristic;

impl UrlHeuristic {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn analyze(&self, raw_url: &str) -> UrlAnalysisResult {
        let lower = raw_url.trim().to_lowercase();
        let normalized = if lower.starts_with("http://") || lower.starts_with("https://") {
            lower
        } else {
            format!("https://{lower}")
        };

        let Ok(parsed) = Url::parse(&normalized) else {
            return UrlAnalysisResult {
                verdict: UrlVerdict::Unclear,
                confidence: 0.0,
                signals: vec!["url_parse_error".to_string()],
                domain: String::new(),
                is_https: false,
            };
        };

        let domain = parsed.host_str().unwrap_or_default().to_string();
        let path = parsed.path().to_string();
        let is_https = parsed.scheme() == "https";

        let mut signals = Vec::new();
        if !is_https {
            signals.push("kein_https".to_string());
        }

        let full = format!("{domain}{path}");
        let mut old_signals = Vec::new();
        let mut worst = None;
        for pattern in OLD_HOSTING.iter() {
            if pattern.re.is_match(&full) {
                old_signals.push(pattern.signal.to_string());
                if worst.is_none() || pattern.verdict == UrlVerdict::DefinitelyOld {
                    worst = Some(pattern.verdict);
                }
            }
        }
        if let Some(verdict) = worst {
            signals.extend(old_signals);
            let confidence = if verdict == UrlVerdict::DefinitelyOld { 0.9 } else { 0.7 };
            return UrlAnalysisResult { verdict, confidence, signals, domain, is_https };
        }

        let baukasten_signals: Vec<String> = BAUKASTEN
            .iter()
            .filter(|(re, _)| re.is_match(&domain))
            .map(|(_, signal)| (*signal).to_string())
            .collect();
        if !baukasten_signals.is_empty() {
            signals.extend(baukasten_signals);
            return UrlAnalysisResult {
                verdict: UrlVerdict::Baukasten,
                confidence: 0.95,
                signals,
                domain,
                is_https,
            };
        }

        let modern_signals: Vec<String> = MODERN
            .iter()
            .filter(|(re, _)| re.is_match(&domain))
            .map(|(_, signal)| format!("modern_{signal}"))
            .collect();
        if !modern_signals.is_empty() {
            signals.extend(modern_signals);
            return UrlAnalysisResult {
                verdict: UrlVerdict::ProbablyModern,
                confidence: 0.8,
                signals,
                domain,
                is_https,
            };
        }

        let path_signals: Vec<String> = SUSPICIOUS_PATH
            .iter()
            .filter(|(re, _)| re.is_match(&path))
            .map(|(_, signal)| (*signal).to_string())
            .collect();
        signals.extend(path_signals);

        if !is_https && signals.len() > 1 {
            return UrlAnalysisResult {
                verdict: UrlVerdict::ProbablyOld,
                confidence: 0.6,
                signals,
                domain,
                is_https,
            };
        }

        if !signals.is_empty() {
            return UrlAnalysisResult {
                verdict: UrlVerdict::Unclear,
                confidence: 0.3,
                signals,
                domain,
                is_https,
            };
        }

        UrlAnalysisResult { verdict: UrlVerdict::Unclear, confidence: 0.0, signals, domain, is_https }
    }

    #[must_use]
    pub fn needs_further_check(&self, url: &str) -> bool {
        self.analyze(url).verdict == UrlVerdict::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geocities_is_definitely_old() {
        let result = UrlHeuristic::new().analyze("http://www.geocities.com/myshop");
        assert_eq!(result.verdict, UrlVerdict::DefinitelyOld);
    }

    #[test]
    fn wix_is_baukasten() {
        let result = UrlHeuristic::new().analyze("https://myshop.wixsite.com/home");
        assert_eq!(result.verdict, UrlVerdict::Baukasten);
    }

    #[test]
    fn vercel_is_probably_modern() {
        let result = UrlHeuristic::new().analyze("https://myshop.vercel.app");
        assert_eq!(result.verdict, UrlVerdict::ProbablyModern);
    }

    #[test]
    fn plain_domain_is_unclear() {
        let result = UrlHeuristic::new().analyze("https://example-shop.de");
        assert_eq!(result.verdict, UrlVerdict::Unclear);
    }
}
