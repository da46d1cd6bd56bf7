//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`PageFetcher`] capability
//! - HTML parsing and link extraction
//! - Page crawler workers and the backends that run them
//! - Overall crawl coordination

mod backend;
mod coordinator;
mod fetcher;
mod parser;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    ConcurrencyMode, TaskBackend, ThreadBackend, WorkerBackend, WorkerFuture, WorkerHandle,
};
pub use coordinator::{SiteCrawler, DEFAULT_OUTPUT_CAPACITY};
pub use fetcher::{
    build_http_client, is_html_content_type, Credentials, FetchOutcome, HttpFetcher, PageFetcher,
    MAX_REDIRECTS,
};
pub use parser::{LinkExtractor, ParsedPage, ParserKind};
pub use worker::{
    PageCrawler, WorkItem, WorkerConfig, WorkerInput, WorkerState, DEFAULT_TIMEOUT,
};

use crate::config::Config;
use crate::site::Site;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher and worker backend from the configuration
/// 2. Seed the frontier and start the worker pool
/// 3. Fetch pages, extract links and follow in-scope ones
/// 4. Stop the pool once no work is outstanding
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Site)` - Crawl completed; the site holds every checked page
/// * `Err(CrawlError)` - Crawl failed
pub async fn crawl(config: &Config) -> Result<Site, CrawlError> {
    SiteCrawler::from_config(config)?.crawl().await
}
