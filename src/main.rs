//! Sitecheck main entry point
//!
//! This is the command-line interface for the sitecheck link checker.

use anyhow::Context;
use clap::Parser;
use sitecheck::config::{compute_config_hash, read_config, validate, Config};
use sitecheck::crawler::{crawl, ConcurrencyMode, Credentials, ParserKind};
use sitecheck::output::{generate_markdown_report, write_report, ReportInfo};
use sitecheck::site::LinkType;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Sitecheck: a concurrent website link checker
///
/// Sitecheck crawls every page reachable from the seed URLs within the
/// accepted hosts, and checks that each linked page, image, script and
/// stylesheet can be fetched. Links leaving the accepted hosts are checked
/// but not followed.
#[derive(Parser, Debug)]
#[command(name = "sitecheck")]
#[command(version)]
#[command(about = "A concurrent website link checker", long_about = None)]
struct Cli {
    /// URLs to start crawling from
    #[arg(value_name = "SEEDS")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Additional host whose pages are crawled (e.g. "*.example.com")
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// Number of concurrent page crawlers
    #[arg(short, long)]
    workers: Option<usize>,

    /// How page crawlers are executed
    #[arg(short, long, value_enum)]
    mode: Option<ConcurrencyMode>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Link type to check (a, img, script, link); repeatable
    #[arg(short = 'T', long = "type", value_name = "TYPE", value_parser = parse_link_type)]
    types: Vec<LinkType>,

    /// Username for HTTP basic auth
    #[arg(short, long)]
    username: Option<String>,

    /// Password for HTTP basic auth
    #[arg(short, long, requires = "username")]
    password: Option<String>,

    /// HTML parsing strategy
    #[arg(long, value_enum)]
    parser: Option<ParserKind>,

    /// Write a markdown report to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<String>,

    /// List healthy pages in the report as well
    #[arg(long)]
    show_all: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

fn parse_link_type(value: &str) -> Result<LinkType, String> {
    LinkType::from_tag(value).ok_or_else(|| {
        format!(
            "unknown link type '{}' (expected one of: a, img, script, link)",
            value
        )
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs the command; returns false when the crawl found error pages
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = read_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(true);
    }

    let site = crawl(&config).await.context("Crawl failed")?;

    if !cli.quiet {
        let stdout = std::io::stdout();
        write_report(&site, config.output.show_all, &mut stdout.lock())?;
    }

    if let Some(path) = &config.output.summary_path {
        let info = ReportInfo::now(config.scope.seeds.clone(), config_hash);
        generate_markdown_report(&site, &info, Path::new(path))
            .with_context(|| format!("Failed to write report to {}", path))?;
        tracing::info!("Report written to: {}", path);
    }

    Ok(site.error_count() == 0)
}

/// Applies command-line values on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    config.scope.seeds.extend(cli.seeds.iter().cloned());
    config.scope.accepted_hosts.extend(cli.hosts.iter().cloned());

    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(mode) = cli.mode {
        config.crawler.mode = mode;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.timeout_secs = timeout;
    }
    if !cli.types.is_empty() {
        config.crawler.types = cli.types.clone();
    }
    if let Some(parser) = cli.parser {
        config.crawler.parser = parser;
    }
    if let Some(username) = &cli.username {
        config.credentials = Some(Credentials {
            username: username.clone(),
            password: cli.password.clone(),
        });
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = Some(summary.clone());
    }
    if cli.show_all {
        config.output.show_all = true;
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitecheck=info,warn"),
            1 => EnvFilter::new("sitecheck=debug,info"),
            2 => EnvFilter::new("sitecheck=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn print_dry_run(config: &Config) {
    println!("=== Sitecheck Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {} ({:?})", config.crawler.workers, config.crawler.mode);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Parser: {:?}", config.crawler.parser);
    let types: Vec<String> = config.crawler.types.iter().map(|t| t.to_string()).collect();
    println!("  Link types: {}", types.join(", "));
    println!("  User agent: {}", config.crawler.user_agent);
    if let Some(credentials) = &config.credentials {
        println!("  Basic auth user: {}", credentials.username);
    }

    let scope = config.scope();
    println!("\nSeeds ({}):", scope.seeds().len());
    for seed in scope.seeds() {
        println!("  - {}", seed);
    }

    println!("\nAccepted hosts:");
    for host in scope.accepted_hosts() {
        println!("  - {}", host);
    }

    if let Some(path) = &config.output.summary_path {
        println!("\nReport: {}", path);
    }

    println!("\n✓ Configuration is valid");
}
