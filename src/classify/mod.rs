//! Website-age classification cascade (§4.I-L): URL heuristic, header probe,
//! HTML probe, fused into a single verdict with short-circuiting.

pub mod header_analyzer;
pub mod html_analyzer;
pub mod site_classifier;
pub mod url_heuristic;

pub use header_analyzer::{HeaderAnalysisResult, HeaderAnalyzer, HeaderVerdict};
pub use html_analyzer::{HtmlAnalysisResult, HtmlAnalyzer, HtmlVerdict};
pub use site_classifier::SiteClassifier;
pub use url_heuristic::{UrlAnalysisResult, UrlHeuristic, UrlVerdict};
