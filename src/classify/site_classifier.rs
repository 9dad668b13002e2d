//! Three-level cascade orchestration (§4.L): URL heuristic short-circuits
//! definite verdicts; otherwise a HEAD header probe runs, and only if that
//! too is unclear does a full HTML GET run.

use std::time::Instant;

use crate::config::WebsiteCheckDepth;
use crate::fetch::rate_governor::DomainKind;
use crate::fetch::FetchClient;
use crate::model::{ProbeLevel, Verdict, WebsiteVerdict};

use super::header_analyzer::{HeaderAnalyzer, HeaderVerdict};
use super::html_analyzer::{HtmlAnalyzer, HtmlVerdict};
use super::url_heuristic::{UrlHeuristic, UrlVerdict};

pub struct SiteClassifier {
    url_heuristic: UrlHeuristic,
    header_analyzer: HeaderAnalyzer,
    html_analyzer: HtmlAnalyzer,
}

impl Default for SiteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Side a probe leans toward, for the weighted-score finale (§4.L step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lean {
    Old,
    Modern,
    Neither,
}

impl SiteClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self { url_heuristic: UrlHeuristic::new(), header_analyzer: HeaderAnalyzer::new(), html_analyzer: HtmlAnalyzer::new() }
    }

    /// Runs the three-level cascade for `url` up to `depth` (§4.L), returning
    /// on the first decisive stage. The signal list is the union of every
    /// stage actually run, each already prefixed with its stage name.
    pub async fn classify(&self, client: &FetchClient, url: &str, depth: WebsiteCheckDepth) -> WebsiteVerdict {
        let started = Instant::now();
        let mut verdict = WebsiteVerdict::default();
        let finish = |mut verdict: WebsiteVerdict, started: Instant| {
            verdict.elapsed_ms = started.elapsed().as_millis() as u64;
            verdict
        };

        // Step 1: URL heuristic, always runs, no network call.
        let url_result = self.url_heuristic.analyze(url);
        for signal in &url_result.signals {
            verdict.add_signal(ProbeLevel::Url, format!("url:{signal}"));
        }
        if matches!(url_result.verdict, UrlVerdict::DefinitelyOld) {
            verdict.verdict = Verdict::Old;
            return finish(verdict, started);
        }
        if matches!(url_result.verdict, UrlVerdict::Baukasten) {
            verdict.add_signal(ProbeLevel::Url, "url:builder_platform".to_string());
            verdict.verdict = Verdict::Old;
            return finish(verdict, started);
        }

        // Step 2: Fast depth decides from the URL heuristic alone.
        if matches!(depth, WebsiteCheckDepth::Fast) {
            verdict.verdict = match url_result.verdict {
                UrlVerdict::ProbablyModern => Verdict::Modern,
                UrlVerdict::ProbablyOld => Verdict::Old,
                UrlVerdict::Unclear | UrlVerdict::DefinitelyOld | UrlVerdict::Baukasten => Verdict::Unknown,
            };
            return finish(verdict, started);
        }

        // Step 3: header probe.
        let header_result = match client.head(url, DomainKind::External).await {
            Ok(response) => Some(self.header_analyzer.analyze(&response.headers)),
            Err(err) => {
                verdict.error = Some(err.to_string());
                None
            }
        };
        if let Some(header_result) = &header_result {
            for signal in &header_result.signals {
                verdict.add_signal(ProbeLevel::Header, format!("header:{signal}"));
            }
            if matches!(header_result.verdict, HeaderVerdict::DefinitelyOld) {
                verdict.verdict = Verdict::Old;
                return finish(verdict, started);
            }
        }

        let url_lean = match url_result.verdict {
            UrlVerdict::ProbablyOld => Lean::Old,
            UrlVerdict::ProbablyModern => Lean::Modern,
            UrlVerdict::Unclear | UrlVerdict::DefinitelyOld | UrlVerdict::Baukasten => Lean::Neither,
        };
        let header_lean = match header_result.as_ref().map(|r| r.verdict) {
            Some(HeaderVerdict::ProbablyOld) => Lean::Old,
            Some(HeaderVerdict::ProbablyModern) => Lean::Modern,
            _ => Lean::Neither,
        };

        // Step 4: at Normal depth, combine I and J and stop there, unless both are unclear.
        if matches!(depth, WebsiteCheckDepth::Normal) {
            let both_unclear = url_lean == Lean::Neither && header_lean == Lean::Neither;
            if !both_unclear {
                let has_old = url_lean == Lean::Old || header_lean == Lean::Old;
                let has_modern = url_lean == Lean::Modern || header_lean == Lean::Modern;
                verdict.verdict = match (has_old, has_modern) {
                    (true, false) => Verdict::Old,
                    (false, true) => Verdict::Modern,
                    _ => Verdict::Unknown,
                };
                return finish(verdict, started);
            }
        }

        // Step 5: HTML probe, weighted-score finale.
        let html_result = match client.get(url, DomainKind::External).await {
            Ok(response) => Some(self.html_analyzer.analyze(&response.body)),
            Err(err) => {
                verdict.error = Some(err.to_string());
                None
            }
        };
        let html_lean = if let Some(html_result) = &html_result {
            for signal in &html_result.signals {
                verdict.add_signal(ProbeLevel::Html, format!("html:{signal}"));
            }
            if matches!(html_result.verdict, HtmlVerdict::DefinitelyOld) {
                verdict.verdict = Verdict::Old;
                return finish(verdict, started);
            }
            match html_result.verdict {
                HtmlVerdict::ProbablyOld => Lean::Old,
                HtmlVerdict::ProbablyModern => Lean::Modern,
                HtmlVerdict::Unclear | HtmlVerdict::DefinitelyOld | HtmlVerdict::Error => Lean::Neither,
            }
        } else {
            Lean::Neither
        };

        let old_score = i32::from(url_lean == Lean::Old) * 3
            + i32::from(header_lean == Lean::Old) * 3
            + i32::from(html_lean == Lean::Old) * 4;
        let modern_score = i32::from(url_lean == Lean::Modern) * 2
            + i32::from(header_lean == Lean::Modern) * 2
            + i32::from(html_lean == Lean::Modern) * 3;

        verdict.verdict = match old_score.cmp(&modern_score) {
            std::cmp::Ordering::Greater => Verdict::Old,
            std::cmp::Ordering::Less => Verdict::Modern,
            std::cmp::Ordering::Equal => Verdict::Unknown,
        };

        finish(verdict, started)
    }
}
