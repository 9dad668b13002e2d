//! Orchestrator (§4.O): stage sequencing, checkpoint/resume, progress
//! reporting and run statistics, grounded on the original `pipeline/scraper.py`.

pub mod checkpoint;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::aggregate::LeadAggregator;
use crate::browser::{BrowserCapability, ChromeBrowser, WaitCondition};
use crate::classify::SiteClassifier;
use crate::config::{DataSource, RunConfig};
use crate::error::{FetchError, ScrapeError, ScrapeResult};
use crate::fetch::rate_governor::DomainKind;
use crate::fetch::{FetchClient, ProxyRotator, RateGovernor};
use crate::filter::{sort_leads, LeadFilter, SortKey};
use crate::model::{Lead, RunResult, RunStats, Source, Verdict, WebsiteVerdict};
use crate::parse::{DetailParser, ListingParser, MapParser};

use self::checkpoint::Checkpoint;

const DIRECTORY_BASE_URL: &str = "https://www.gelbeseiten.de";
const CHECKPOINT_EVERY_N_CATEGORIES: usize = 10;

/// Invoked as `(message, current, total)` after each unit of stage progress (§4.O).
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

fn search_url(category: &str, city: &str, page: u32) -> String {
    let category = urlencoding::encode(category);
    let city = urlencoding::encode(city);
    if page <= 1 {
        format!("{DIRECTORY_BASE_URL}/Suche/{category}/{city}")
    } else {
        format!("{DIRECTORY_BASE_URL}/Suche/{category}/{city}?seite={page}")
    }
}

fn maps_search_url(category: &str, city: &str) -> String {
    format!("https://www.google.com/maps/search/{}", urlencoding::encode(&format!("{category} {city}")))
}

fn merge_stats(into: &mut RunStats, from: &RunStats) {
    into.directory_pages_scraped += from.directory_pages_scraped;
    into.directory_listings_found += from.directory_listings_found;
    into.directory_leads_created += from.directory_leads_created;
    into.map_pages_scraped += from.map_pages_scraped;
    into.map_listings_found += from.map_listings_found;
    into.map_leads_created += from.map_leads_created;
    into.duplicates_found += from.duplicates_found;
    into.merged += from.merged;
    into.websites_checked += from.websites_checked;
    into.verdict_old += from.verdict_old;
    into.verdict_modern += from.verdict_modern;
    into.verdict_unknown += from.verdict_unknown;
    into.verdict_absent += from.verdict_absent;
    into.leads_after_filter += from.leads_after_filter;
    into.leads_exported += from.leads_exported;
}

/// Drives the full four-stage pipeline (§2 data flow) for one run, owning the
/// Fetch Client, Rate Governor and Proxy Rotator for its lifetime.
pub struct Orchestrator {
    config: RunConfig,
    fetch: FetchClient,
    governor: Arc<RateGovernor>,
    proxies: Arc<ProxyRotator>,
    progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let stealth = config.stealth.enabled.then(|| config.stealth.clone());
        let governor = Arc::new(RateGovernor::new(config.rate_limit.clone(), stealth));
        let proxies = Arc::new(ProxyRotator::new(
            config.proxy.enabled,
            config.proxy.rotate_every_n_requests,
            config.proxy.max_failures_before_block,
        ));
        if config.proxy.enabled && let Some(path) = &config.proxy.proxy_file {
            match proxies.load_from_file(Path::new(path)) {
                Ok(count) => info!(count, "loaded proxies"),
                Err(err) => warn!(%err, path, "failed to load proxy file"),
            }
        }
        let fetch = FetchClient::new(Arc::clone(&governor), 10, Arc::clone(&proxies));
        Self { config, fetch, governor, proxies, progress: None, cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    /// Shared flag a caller can set (e.g. from a ctrl-c listener) to make an
    /// in-progress run unwind cooperatively: the directory/map/classify loops
    /// and `run_categories`' category loop all poll it the same way they
    /// already poll the stealth session ceiling (§5, §7).
    #[must_use]
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn emit_progress(&self, message: &str, current: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(message, current, total);
        }
    }

    #[must_use]
    pub fn proxies(&self) -> &ProxyRotator {
        &self.proxies
    }

    /// Stage 1a (§4.F/G): paginated directory scrape, bounded by
    /// `max_pages`/`max_leads`. Returns `(leads, session_limit_hit)` — the
    /// second element is never an error (§4.B, §7): it is the cooperative
    /// termination signal, and whatever leads were gathered up to that point
    /// are returned alongside it.
    async fn scrape_directory(&self, category: &str, city: &str, result: &mut RunResult, stats: &mut RunStats) -> (Vec<Lead>, bool) {
        let listing_parser = ListingParser::new(DIRECTORY_BASE_URL);
        let detail_parser = DetailParser::new();
        let mut leads = Vec::new();

        let mut page = 1_u32;
        loop {
            if page as usize > self.config.max_pages || leads.len() >= self.config.max_leads {
                break;
            }
            if self.cancelled() {
                return (leads, true);
            }
            self.emit_progress(&format!("scraping directory page {page}"), page as usize, self.config.max_pages);

            let url = search_url(category, city, page);
            let response = match self.fetch.get(&url, DomainKind::Directory).await {
                Ok(response) => response,
                Err(FetchError::SessionLimit { .. }) => return (leads, true),
                Err(err) => {
                    result.push_error(format!("directory page {page}: {err}"));
                    break;
                }
            };
            stats.directory_pages_scraped += 1;
            result.pages_scraped += 1;

            let stubs = listing_parser.parse(&response.body, Source::Directory);
            stats.directory_listings_found += stubs.len();
            if stubs.is_empty() {
                break;
            }

            for stub in stubs {
                if leads.len() >= self.config.max_leads {
                    break;
                }
                let detail = match self.fetch.get(&stub.detail_url, DomainKind::Directory).await {
                    Ok(response) => response,
                    Err(FetchError::SessionLimit { .. }) => return (leads, true),
                    Err(err) => {
                        result.push_error(format!("directory detail {}: {err}", stub.detail_url));
                        continue;
                    }
                };

                match detail_parser.parse(&detail.body, &stub.detail_url, city, category) {
                    Some(mut lead) => {
                        if lead.phone.is_none() {
                            lead.phone = stub.phone.clone();
                        }
                        if lead.rating.is_none() {
                            lead.rating = stub.rating;
                            lead.rating_count = stub.rating_count;
                        }
                        if lead.website_url.is_none() && stub.website_url.is_some() {
                            lead.website_url = stub.website_url.clone();
                        }
                        stats.directory_leads_created += 1;
                        leads.push(lead);
                    }
                    None => debug!(url = %stub.detail_url, "directory detail parser miss, dropping record"),
                }
            }

            let (_current, _total, has_next) = ListingParser::pagination_of(&response.body);
            if !has_next {
                break;
            }
            page += 1;
        }

        (leads, false)
    }

    /// Stage 1b (§4.H): map-service scrape, pull-driven scrolling controlled
    /// by the orchestrator rather than the (pure) parser (§9 design note).
    async fn scrape_map<B: BrowserCapability>(
        &self,
        browser: &B,
        category: &str,
        city: &str,
        result: &mut RunResult,
        stats: &mut RunStats,
    ) -> (Vec<Lead>, bool) {
        let parser = MapParser::new();
        let url = maps_search_url(category, city);

        self.emit_progress("scraping map results", 0, 1);
        let outcome = match browser.navigate(&url, WaitCondition::Load).await {
            Ok(outcome) => outcome,
            Err(err) => {
                result.push_error(format!("map navigate failed: {err}"));
                return (Vec::new(), false);
            }
        };
        stats.map_pages_scraped += 1;
        result.pages_scraped += 1;

        if let Err(err) = browser.scroll_to_bottom(Duration::from_millis(800), 10).await {
            debug!(%err, "map results scroll stopped early");
        }
        let body = browser.content().await.unwrap_or(outcome.body);
        let stubs = parser.parse_search_results(&body);
        stats.map_listings_found += stubs.len();

        let mut leads = Vec::new();
        for (index, stub) in stubs.into_iter().enumerate() {
            if leads.len() >= self.config.max_leads {
                break;
            }
            if self.governor.session_limit_reached() || self.cancelled() {
                return (leads, true);
            }
            if self.governor.acquire("www.google.com", DomainKind::Map).await.is_err() {
                return (leads, true);
            }
            self.emit_progress("scraping map detail", index + 1, 0);

            let detail = match browser.navigate(&stub.detail_url, WaitCondition::Load).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    result.push_error(format!("map detail {}: {err}", stub.detail_url));
                    continue;
                }
            };
            let detail_body = browser.content().await.unwrap_or(detail.body);
            if let Some(lead) = parser.parse_detail_page(&detail_body, stub.place_id.as_deref()) {
                stats.map_leads_created += 1;
                leads.push(lead);
            }
        }

        (leads, false)
    }

    /// Stage 3 (§4.L): classifies every lead's website, short-circuiting the
    /// whole stage (not merely the per-lead cascade) once the stealth session
    /// ceiling is hit, rather than letting every remaining lead fail in turn.
    async fn classify_leads(&self, mut leads: Vec<Lead>, stats: &mut RunStats) -> (Vec<Lead>, bool) {
        let classifier = SiteClassifier::new();
        for lead in &mut leads {
            match &lead.website_url {
                Some(url) if !url.is_empty() => {
                    if self.governor.session_limit_reached() || self.cancelled() {
                        return (leads, true);
                    }
                    stats.websites_checked += 1;
                    let verdict = classifier.classify(&self.fetch, url, self.config.website_check_depth).await;
                    stats.record_verdict(verdict.verdict);
                    lead.website_verdict = verdict;
                }
                _ => {
                    lead.website_verdict = WebsiteVerdict::absent();
                    stats.record_verdict(Verdict::Absent);
                }
            }
        }
        (leads, false)
    }

    /// Stage 4 (§4.N): inclusion gates, then quality-score ranking.
    fn filter_and_rank(&self, leads: Vec<Lead>, stats: &mut RunStats) -> Vec<Lead> {
        let mut filter = LeadFilter::new(self.config.filter.clone());
        let filtered = filter.filter_leads(leads);
        stats.leads_after_filter += filtered.len();
        let ranked = sort_leads(filtered, SortKey::Quality, true);
        stats.leads_exported += ranked.len();
        ranked
    }

    /// Runs the complete pipeline for one category against one city (§2).
    pub async fn run(&self, category: &str, city: &str) -> ScrapeResult<(RunResult, RunStats)> {
        let started = Instant::now();
        let mut result = RunResult::empty();
        let mut stats = RunStats::default();

        let (directory_leads, directory_limited) = self.scrape_directory(category, city, &mut result, &mut stats).await;

        let mut map_leads = Vec::new();
        let mut map_limited = false;
        if !directory_limited && matches!(self.config.sources, DataSource::Map | DataSource::All) {
            let proxy_url = self.proxies.next().map(|p| p.url());
            match ChromeBrowser::launch_with_proxy(self.config.headless, proxy_url.as_deref()).await {
                Ok(browser) => {
                    let (leads, limited) = self.scrape_map(&browser, category, city, &mut result, &mut stats).await;
                    map_leads = leads;
                    map_limited = limited;
                }
                Err(err) => result.push_error(format!("browser launch failed: {err}")),
            }
        }

        result.total_discovered = directory_leads.len() + map_leads.len();

        let mut aggregator = LeadAggregator::new(self.config.aggregator.clone());
        let merged = aggregator.aggregate(directory_leads, map_leads);
        let agg_stats = aggregator.stats();
        stats.duplicates_found += agg_stats.duplicates_found;
        stats.merged += agg_stats.merged_leads;

        let (classified, classify_limited) = self.classify_leads(merged, &mut stats).await;
        let ranked = self.filter_and_rank(classified, &mut stats);

        result.total_after_filter = ranked.len();
        result.leads = ranked;
        result.partial = directory_limited || map_limited || classify_limited;
        result.duration_seconds = started.elapsed().as_secs_f64();

        if result.partial {
            info!(category, city, leads = result.leads.len(), "session limit reached, returning partial-success run");
        }

        Ok((result, stats))
    }

    /// Multi-category orchestration over one city, with checkpoint/resume
    /// (§4.O). `checkpoint_dir` is typically the current working directory.
    pub async fn run_categories(&self, categories: &[&str], checkpoint_dir: &Path) -> ScrapeResult<(RunResult, RunStats)> {
        let city_slug = self.config.city_slug();
        let mut checkpoint = Checkpoint::load(checkpoint_dir, &city_slug).unwrap_or_default();
        if !checkpoint.processed_categories.is_empty() {
            info!(resumed = checkpoint.processed_categories.len(), leads = checkpoint.leads.len(), "resuming from checkpoint");
        }
        let already_processed: std::collections::BTreeSet<String> = checkpoint.processed_categories.iter().cloned().collect();

        let started = Instant::now();
        let mut combined_stats = RunStats::default();
        let mut total_discovered = 0_usize;
        let mut total_pages = 0_usize;
        let mut errors = Vec::new();
        let mut partial = false;

        for (index, &category) in categories.iter().enumerate() {
            if already_processed.contains(category) {
                continue;
            }
            if self.cancelled() {
                partial = true;
                break;
            }
            self.emit_progress(category, index + 1, categories.len());

            let (run_result, stats) = self.run(category, &self.config.city).await?;
            total_discovered += run_result.total_discovered;
            total_pages += run_result.pages_scraped;
            errors.extend(run_result.errors);
            merge_stats(&mut combined_stats, &stats);
            checkpoint.leads.extend(run_result.leads);
            checkpoint.processed_categories.push(category.to_string());

            if checkpoint.processed_categories.len().is_multiple_of(CHECKPOINT_EVERY_N_CATEGORIES) {
                self.save_checkpoint(&checkpoint, checkpoint_dir, &city_slug)?;
            }

            if run_result.partial || self.cancelled() {
                partial = true;
                break;
            }
        }

        let fully_complete = !partial && checkpoint.processed_categories.len() >= categories.len();
        if fully_complete {
            Checkpoint::delete(checkpoint_dir, &city_slug);
        } else {
            self.save_checkpoint(&checkpoint, checkpoint_dir, &city_slug)?;
        }

        let mut result = RunResult::empty();
        result.leads = sort_leads(checkpoint.leads, SortKey::Quality, true);
        result.total_discovered = total_discovered;
        result.total_after_filter = result.leads.len();
        result.pages_scraped = total_pages;
        result.duration_seconds = started.elapsed().as_secs_f64();
        result.partial = partial;
        for error in errors {
            result.push_error(error);
        }
        combined_stats.leads_exported = result.leads.len();

        Ok((result, combined_stats))
    }

    fn save_checkpoint(&self, checkpoint: &Checkpoint, dir: &Path, city_slug: &str) -> ScrapeResult<()> {
        checkpoint.save(dir, city_slug).map_err(|err| ScrapeError::Other(anyhow::anyhow!(err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_first_page_has_no_query() {
        let url = search_url("Friseur", "Berlin", 1);
        assert_eq!(url, "https://www.gelbeseiten.de/Suche/Friseur/Berlin");
    }

    #[test]
    fn search_url_later_page_has_seite_param() {
        let url = search_url("Friseur", "Berlin", 2);
        assert!(url.ends_with("?seite=2"));
    }
}
