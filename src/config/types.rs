use crate::crawler::{ConcurrencyMode, Credentials, ParserKind, WorkerConfig};
use crate::site::LinkType;
use crate::url::ScopeConfig;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for sitecheck
///
/// Every section is optional in the file; missing values take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub scope: ScopeSettings,
    pub credentials: Option<Credentials>,
    pub output: OutputConfig,
}

impl Config {
    /// The seed URLs and accepted hosts of this run
    pub fn scope(&self) -> ScopeConfig {
        ScopeConfig::new(self.scope.seeds.iter().cloned(), &self.scope.accepted_hosts)
    }

    /// The settings every worker shares
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            credentials: self.credentials.clone(),
            link_types: self.crawler.types.clone(),
            timeout: self.crawler.timeout(),
            parser: self.crawler.parser,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent page crawlers
    pub workers: usize,

    /// How the page crawlers are executed
    pub mode: ConcurrencyMode,

    /// Per-request timeout in seconds
    pub timeout_secs: f64,

    /// HTML parsing strategy
    pub parser: ParserKind,

    /// Link types to extract and check
    pub types: Vec<LinkType>,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Results buffered between the workers and the coordinator
    pub output_capacity: usize,
}

impl CrawlerConfig {
    /// The per-request timeout as a `Duration`
    ///
    /// Negative or non-finite values map to zero, which validation rejects.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            mode: ConcurrencyMode::default(),
            timeout_secs: 10.0,
            parser: ParserKind::default(),
            types: LinkType::ALL.to_vec(),
            user_agent: format!("sitecheck/{}", env!("CARGO_PKG_VERSION")),
            output_capacity: 64,
        }
    }
}

/// Where the crawl starts and which hosts are explored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScopeSettings {
    /// URLs the crawl starts from
    pub seeds: Vec<String>,

    /// Host patterns (e.g., "example.com" or "*.example.com") whose pages
    /// are parsed for further links, in addition to the seed hosts
    pub accepted_hosts: Vec<String>,
}

/// Report configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the markdown report, if one should be written
    pub summary_path: Option<String>,

    /// List healthy pages in the console report as well
    pub show_all: bool,
}
