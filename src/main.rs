//! Command-line front end (§6). Wires flags onto `RunConfig`, drives the
//! `Orchestrator`, and writes the exported leads.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use gelbe_leads::config::{DataSource, OutputFormat, WebsiteCheckDepth};
use gelbe_leads::export::{CsvExporter, CsvFieldSet, JsonExporter};
use gelbe_leads::{Orchestrator, RunConfig, ScrapeError};
use tracing::{error, info, warn};

/// Discover small-business leads from a public directory and classify their
/// websites by apparent age.
#[derive(Debug, Parser)]
#[command(name = "gelbe-leads", version)]
struct Cli {
    /// Business category to search for (e.g. "Friseur").
    #[arg(short = 'b', long = "branche")]
    category: Option<String>,

    /// City to search in.
    #[arg(short = 's', long = "stadt")]
    city: String,

    /// Run every category in the built-in list against `city`.
    #[arg(long = "all-branchen", conflicts_with = "category")]
    all_categories: bool,

    /// Run a curated subset of categories by tag (e.g. "handwerk", "beauty").
    #[arg(long = "kategorie", conflicts_with = "category")]
    category_tag: Option<String>,

    /// Maximum number of leads to return.
    #[arg(short = 'l', long = "limit", default_value_t = 100)]
    limit: usize,

    /// Maximum directory pages to scrape per category.
    #[arg(long = "max-pages", default_value_t = 50)]
    max_pages: usize,

    /// Which sources to scrape.
    #[arg(long = "sources", value_enum, default_value_t = DataSource::Directory)]
    sources: DataSource,

    /// Website-age classification depth.
    #[arg(short = 'w', long = "tiefe", value_enum, default_value_t = WebsiteCheckDepth::Normal)]
    depth: WebsiteCheckDepth,

    /// Include leads whose website was classified as modern.
    #[arg(long = "include-modern")]
    include_modern: bool,

    /// Minimum quality score (0-100) a lead must reach to be exported.
    #[arg(long = "min-quality", default_value_t = 0)]
    min_quality: u8,

    /// Drop leads without a phone number.
    #[arg(long = "require-phone")]
    require_phone: bool,

    /// Drop leads without an email address.
    #[arg(long = "require-email")]
    require_email: bool,

    /// Drop leads whose name contains any of these terms (repeatable).
    #[arg(long = "blacklist")]
    blacklist: Vec<String>,

    /// Keep only leads whose category contains one of these terms (repeatable).
    #[arg(long = "whitelist")]
    whitelist: Vec<String>,

    /// Keep only leads whose postal code starts with one of these prefixes (repeatable).
    #[arg(long = "plz-prefix")]
    plz_prefixes: Vec<String>,

    /// Route outbound requests through a rotating proxy pool.
    #[arg(long = "use-proxies")]
    use_proxies: bool,

    /// Path to a proxy list file (one `[scheme://][user:pass@]host:port` per line).
    #[arg(long = "proxy-file")]
    proxy_file: Option<String>,

    /// Show the browser window instead of running headless (map source only).
    #[arg(long = "show-browser")]
    show_browser: bool,

    /// Enable stealth mode: slower pacing, hard session ceilings.
    #[arg(long = "stealth")]
    stealth: bool,

    /// Stealth session wall-clock cap, in minutes.
    #[arg(long = "session-duration", default_value_t = 180)]
    session_duration_minutes: u32,

    /// Output file path (extension-less; format suffix is appended).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Verbose logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Debug-level logging.
    #[arg(long = "debug")]
    debug: bool,

    /// Suppress non-error output.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let filter = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(filter)).init();
}

fn categories_for(cli: &Cli) -> Result<Vec<&'static str>, String> {
    if cli.all_categories {
        return Ok(gelbe_leads::categories::CATEGORIES.to_vec());
    }
    if let Some(tag) = &cli.category_tag {
        let subset = gelbe_leads::categories::categories_for_tag(Some(tag));
        return Ok(subset.to_vec());
    }
    if cli.category.is_some() {
        return Ok(Vec::new());
    }
    Err("one of --branche, --all-branchen or --kategorie is required".to_string())
}

fn build_config(cli: &Cli) -> RunConfig {
    let mut config = RunConfig::new(cli.category.clone().unwrap_or_default(), cli.city.clone());
    config.max_leads = cli.limit;
    config.max_pages = cli.max_pages;
    config.sources = cli.sources;
    config.website_check_depth = cli.depth;
    config.filter.include_modern_website = cli.include_modern;
    config.filter.min_quality_score = cli.min_quality;
    config.filter.require_phone = cli.require_phone;
    config.filter.require_email = cli.require_email;
    config.proxy.enabled = cli.use_proxies;
    config.proxy.proxy_file = cli.proxy_file.clone();
    config.headless = !cli.show_browser;
    config.stealth.enabled = cli.stealth;
    config.stealth.max_session_duration_minutes = cli.session_duration_minutes;
    config.verbose = cli.verbose;
    config.debug = cli.debug;
    config.quiet = cli.quiet;
    config
}

fn export_path(cli: &Cli, config: &RunConfig, extension: &str) -> PathBuf {
    cli.output.clone().unwrap_or_else(|| PathBuf::from(format!("leads_{}_{}", config.city_slug(), extension)))
}

fn write_output(
    cli: &Cli,
    config: &RunConfig,
    result: &gelbe_leads::RunResult,
    stats: &gelbe_leads::RunStats,
    category_label: &str,
) -> anyhow::Result<()> {
    let write_json = matches!(cli.format, OutputFormat::Json | OutputFormat::Both);
    let write_csv = matches!(cli.format, OutputFormat::Csv | OutputFormat::Both);

    if write_json {
        let exporter = JsonExporter::new(config.export.clone());
        let document = exporter.build(result, stats, category_label, &config.city, config.sources, &config.filter);
        let path = export_path(cli, config, "json");
        exporter.write(&document, &path)?;
        info!(path = %path.display(), "wrote JSON export");
    }
    if write_csv {
        let exporter = CsvExporter::default();
        let path = export_path(cli, config, "csv");
        exporter.export(&result.leads, &path, CsvFieldSet::Default)?;
        info!(path = %path.display(), "wrote CSV export");
    }
    Ok(())
}

fn apply_custom_filters(cli: &Cli, leads: Vec<gelbe_leads::Lead>) -> Vec<gelbe_leads::Lead> {
    use gelbe_leads::config::FilterConfig;
    use gelbe_leads::filter::{create_blacklist_filter, create_region_filter, create_whitelist_filter, LeadFilter};

    if cli.blacklist.is_empty() && cli.whitelist.is_empty() && cli.plz_prefixes.is_empty() {
        return leads;
    }
    let mut filter = LeadFilter::new(FilterConfig { min_quality_score: 0, ..FilterConfig::default() });
    if !cli.blacklist.is_empty() {
        filter.add_custom_filter(create_blacklist_filter(cli.blacklist.clone()));
    }
    if !cli.whitelist.is_empty() {
        filter.add_custom_filter(create_whitelist_filter(cli.whitelist.clone()));
    }
    if !cli.plz_prefixes.is_empty() {
        filter.add_custom_filter(create_region_filter(cli.plz_prefixes.clone()));
    }
    filter.filter_leads(leads)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let categories = match categories_for(&cli) {
        Ok(categories) => categories,
        Err(message) => {
            error!("{message}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let mut config = build_config(&cli);
    let category_label = if categories.is_empty() { config.category.clone() } else { "multiple".to_string() };

    let mut orchestrator = Orchestrator::new(config.clone());
    orchestrator.set_progress_callback(Box::new(|message, current, total| {
        if total > 0 {
            info!("[{current}/{total}] {message}");
        } else {
            info!("{message}");
        }
    }));

    let cancelled = orchestrator.cancellation_flag();
    tokio::spawn({
        let cancelled = std::sync::Arc::clone(&cancelled);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing the current unit of work and flushing the checkpoint");
                cancelled.store(true, Ordering::SeqCst);
            }
        }
    });

    let run_outcome = if categories.is_empty() {
        orchestrator.run(&config.category, &config.city).await
    } else {
        orchestrator.run_categories(&categories, &std::env::current_dir().unwrap_or_default()).await
    };

    if cancelled.load(Ordering::SeqCst) {
        error!("run interrupted; rerun the same command to resume from the checkpoint");
        return std::process::ExitCode::from(1);
    }

    let (mut result, stats) = match run_outcome {
        Ok(outcome) => outcome,
        Err(ScrapeError::Config(message)) => {
            error!("configuration error: {message}");
            return std::process::ExitCode::FAILURE;
        }
        Err(err) => {
            error!("pipeline failed: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    result.leads = apply_custom_filters(&cli, result.leads);
    if result.leads.is_empty() {
        error!("no leads found for this search");
        return std::process::ExitCode::FAILURE;
    }

    config.category = category_label.clone();
    if let Err(err) = write_output(&cli, &config, &result, &stats, &category_label) {
        error!("export failed: {err}");
        return std::process::ExitCode::FAILURE;
    }

    if result.partial {
        info!(leads = result.leads.len(), "run ended early (session limit); exported partial results");
    } else {
        info!(leads = result.leads.len(), "run complete");
    }

    std::process::ExitCode::SUCCESS
}
