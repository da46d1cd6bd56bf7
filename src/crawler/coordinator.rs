//! Site crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Validating the startup configuration
//! - Starting the worker pool through a [`WorkerBackend`]
//! - Seeding and deduplicating the frontier
//! - Draining results into the [`Site`] and scheduling newly found links
//! - Shutting the pool down with one sentinel per worker

use crate::config::Config;
use crate::crawler::backend::WorkerBackend;
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::worker::{PageCrawler, WorkItem, WorkerConfig, WorkerInput};
use crate::site::{PageCrawl, Site};
use crate::url::{normalize, ScopeConfig, UrlSplit};
use crate::{ConfigError, CrawlError};
use kanal::AsyncSender;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Default number of results buffered between workers and the coordinator
pub const DEFAULT_OUTPUT_CAPACITY: usize = 64;

/// URLs already dispatched, plus the count of results still owed
struct Frontier {
    seen: HashSet<UrlSplit>,
    input: AsyncSender<WorkerInput>,
    in_flight: usize,
}

impl Frontier {
    fn new(input: AsyncSender<WorkerInput>) -> Self {
        Self {
            seen: HashSet::new(),
            input,
            in_flight: 0,
        }
    }

    /// Dispatches `url` unless it was dispatched before
    ///
    /// Returns true if a new work item was sent.
    async fn schedule(&mut self, url: UrlSplit, should_expand: bool) -> Result<bool, CrawlError> {
        if self.seen.contains(&url) {
            return Ok(false);
        }
        self.seen.insert(url.clone());

        tracing::debug!(
            "Scheduling {} ({})",
            url,
            if should_expand { "explore" } else { "check" }
        );

        self.input
            .send(WorkerInput::Work(WorkItem { url, should_expand }))
            .await
            .map_err(|_| CrawlError::ChannelClosed("input"))?;
        self.in_flight += 1;
        Ok(true)
    }

    /// Sends one shutdown sentinel per worker
    async fn shutdown(&self, workers: usize) -> Result<(), CrawlError> {
        for _ in 0..workers {
            self.input
                .send(WorkerInput::Shutdown)
                .await
                .map_err(|_| CrawlError::ChannelClosed("input"))?;
        }
        Ok(())
    }
}

/// Crawls a site with a pool of page crawlers
pub struct SiteCrawler {
    scope: ScopeConfig,
    worker_config: Arc<WorkerConfig>,
    workers: usize,
    backend: Box<dyn WorkerBackend>,
    fetcher: Arc<dyn PageFetcher>,
    output_capacity: usize,
}

impl SiteCrawler {
    pub fn new(
        scope: ScopeConfig,
        worker_config: WorkerConfig,
        workers: usize,
        backend: Box<dyn WorkerBackend>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            scope,
            worker_config: Arc::new(worker_config),
            workers,
            backend,
            fetcher,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }

    /// Sets how many results may wait for the coordinator before workers block
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Builds a crawler with an HTTP fetcher from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&config.crawler.user_agent)?;
        Ok(Self::new(
            config.scope(),
            config.worker_config(),
            config.crawler.workers,
            config.crawler.mode.backend(),
            Arc::new(fetcher),
        )
        .with_output_capacity(config.crawler.output_capacity))
    }

    /// Checks the settings that would make a crawl meaningless
    fn validate(&self) -> Result<(), ConfigError> {
        if self.scope.seeds().is_empty() {
            return Err(ConfigError::Validation(
                "at least one seed URL is required".to_string(),
            ));
        }
        if self.scope.accepted_hosts().next().is_none() {
            return Err(ConfigError::Validation(
                "no accepted hosts; every seed is malformed".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "the worker pool needs at least one worker".to_string(),
            ));
        }
        if self.worker_config.timeout.is_zero() {
            return Err(ConfigError::Validation(
                "the request timeout must be greater than zero".to_string(),
            ));
        }
        if self.output_capacity == 0 {
            return Err(ConfigError::Validation(
                "output_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Runs the crawl to completion
    ///
    /// Returns once every dispatched URL has been crawled and all workers
    /// have stopped.
    ///
    /// # Returns
    ///
    /// * `Ok(Site)` - Every page crawled, including failed ones
    /// * `Err(CrawlError)` - Invalid configuration, or the worker pool died
    pub async fn crawl(self) -> Result<Site, CrawlError> {
        self.validate()?;

        let started = Instant::now();
        tracing::info!(
            "Starting crawl: {} seeds, {} workers ({} backend)",
            self.scope.seeds().len(),
            self.workers,
            self.backend.name()
        );

        let (input_tx, input_rx) = kanal::unbounded_async::<WorkerInput>();
        let (output_tx, output_rx) = kanal::bounded_async::<PageCrawl>(self.output_capacity);

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = PageCrawler::new(
                id,
                Arc::clone(&self.worker_config),
                Arc::clone(&self.fetcher),
                input_rx.clone(),
                output_tx.clone(),
            );
            handles.push(self.backend.spawn(id, Box::pin(worker.run()))?);
        }
        // Workers hold the only remaining ends
        drop(input_rx);
        drop(output_tx);

        let mut frontier = Frontier::new(input_tx);
        for seed in self.scope.seeds() {
            match normalize(seed) {
                Ok(url) => {
                    frontier.schedule(url, true).await?;
                }
                Err(e) => tracing::warn!("Skipping malformed seed {:?}: {}", seed, e),
            }
        }

        let mut site = Site::new();
        while frontier.in_flight > 0 {
            let page = output_rx
                .recv()
                .await
                .map_err(|_| CrawlError::ChannelClosed("output"))?;
            frontier.in_flight -= 1;
            self.process_page(page, &mut frontier, &mut site).await?;

            if site.len() % 10 == 0 {
                let rate = site.len() as f64 / started.elapsed().as_secs_f64();
                tracing::info!(
                    "Progress: {} pages crawled, {} in flight, {:.2} pages/sec",
                    site.len(),
                    frontier.in_flight,
                    rate
                );
            }
        }

        frontier.shutdown(self.workers).await?;

        let mut processed = 0;
        for handle in handles {
            processed += handle.join().await?;
        }

        tracing::info!(
            "Crawl complete: {} pages ({} processed by workers), {} errors in {:.2}s",
            site.len(),
            processed,
            site.error_count(),
            started.elapsed().as_secs_f64()
        );

        Ok(site)
    }

    /// Records one result and schedules the links it discovered
    async fn process_page(
        &self,
        page: PageCrawl,
        frontier: &mut Frontier,
        site: &mut Site,
    ) -> Result<(), CrawlError> {
        match page.error_reason() {
            Some(reason) => tracing::warn!("{}: {}", page.url, reason),
            None => tracing::debug!(
                "{}: HTTP {} ({} links)",
                page.url,
                page.status.unwrap_or_default(),
                page.links.len()
            ),
        }

        let mut follow_links = page.is_local;

        if page.is_redirect {
            if let Some(final_url) = &page.final_url {
                let local = self.scope.contains(final_url);
                if !local && follow_links {
                    tracing::debug!(
                        "{} redirected out of scope to {}, not following its links",
                        page.url,
                        final_url
                    );
                    follow_links = false;
                }
                frontier.schedule(final_url.clone(), local).await?;
            }
        }

        if follow_links {
            for link in &page.links {
                let local = self.scope.contains(&link.target);
                frontier.schedule(link.target.clone(), local).await?;
            }
        }

        site.add_page(page);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::backend::{TaskBackend, ThreadBackend};
    use crate::crawler::testing::StaticFetcher;
    use crate::site::FetchFailure;
    use std::time::Duration;

    fn crawler(
        seeds: &[&str],
        hosts: &[&str],
        fetcher: StaticFetcher,
        workers: usize,
    ) -> (SiteCrawler, Arc<StaticFetcher>) {
        let fetcher = Arc::new(fetcher);
        let crawler = SiteCrawler::new(
            ScopeConfig::new(seeds.iter().copied(), hosts),
            WorkerConfig::default(),
            workers,
            Box::new(TaskBackend),
            fetcher.clone(),
        );
        (crawler, fetcher)
    }

    fn small_site() -> StaticFetcher {
        StaticFetcher::new()
            .html(
                "http://example.com/",
                r#"<a href="/a">a</a><a href="/b">b</a><img src="/logo.png">
                   <a href="http://other.org/page">other</a>"#,
            )
            .html(
                "http://example.com/a",
                r#"<a href="/">home</a><a href="/b">b</a><a href="/missing">gone</a>"#,
            )
            .html("http://example.com/b", r#"<a href="/a#top">a</a>"#)
            .asset("http://example.com/logo.png", "image/png")
            .not_found("http://example.com/missing")
            .html("http://other.org/page", r#"<a href="/never">never</a>"#)
    }

    fn url(raw: &str) -> UrlSplit {
        normalize(raw).unwrap()
    }

    #[tokio::test]
    async fn test_crawl_small_site() {
        let (crawler, fetcher) = crawler(&["http://example.com/"], &[], small_site(), 3);

        let site = crawler.crawl().await.unwrap();

        assert_eq!(site.len(), 6);
        assert_eq!(site.error_count(), 1);
        assert_eq!(fetcher.requests(), 6);

        let missing = site.page(&url("http://example.com/missing")).unwrap();
        assert_eq!(missing.status, Some(404));
        assert_eq!(missing.failure, Some(FetchFailure::Http { status: 404 }));
        assert_eq!(
            site.referrers(&missing.url),
            vec![&url("http://example.com/a")]
        );

        // Out of scope pages are checked but never expanded
        let other = site.page(&url("http://other.org/page")).unwrap();
        assert!(!other.is_local);
        assert!(other.links.is_empty());
        assert!(site.page(&url("http://other.org/never")).is_none());

        assert!(site.page(&url("http://example.com/")).unwrap().is_local);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_result_on_thread_backend() {
        let fetcher = Arc::new(small_site());
        let crawler = SiteCrawler::new(
            ScopeConfig::new(["http://example.com/"], Vec::<String>::new()),
            WorkerConfig::default(),
            4,
            Box::new(ThreadBackend),
            fetcher.clone(),
        )
        .with_output_capacity(1);

        let site = crawler.crawl().await.unwrap();
        assert_eq!(site.len(), 6);
        assert_eq!(site.error_count(), 1);
        assert_eq!(fetcher.requests(), 6);
    }

    #[tokio::test]
    async fn test_each_url_fetched_once() {
        let mut fetcher = StaticFetcher::new();
        let links: String = (0..20)
            .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
            .collect();
        fetcher = fetcher.html("http://example.com/", &links);
        for i in 0..20 {
            fetcher = fetcher.html(&format!("http://example.com/p{}", i), &links);
        }
        let (crawler, fetcher) = crawler(&["http://example.com/"], &[], fetcher, 8);

        let site = crawler.crawl().await.unwrap();

        assert_eq!(site.len(), 21);
        assert_eq!(fetcher.requests(), 21);
        assert_eq!(site.error_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_seed_skipped() {
        let (crawler, _) = crawler(
            &["http://example.com/b", "ftp://example.com/"],
            &[],
            small_site(),
            1,
        );

        let site = crawler.crawl().await.unwrap();
        assert!(site.page(&url("http://example.com/b")).is_some());
        assert!(site.page(&url("http://example.com/a")).is_some());
    }

    #[tokio::test]
    async fn test_duplicate_seeds_crawled_once() {
        let fetcher = StaticFetcher::new().html("http://example.com/", "<p>hi</p>");
        let (crawler, fetcher) = crawler(
            &["example.com", "http://example.com/", "http://EXAMPLE.com:80/#x"],
            &[],
            fetcher,
            2,
        );

        let site = crawler.crawl().await.unwrap();
        assert_eq!(site.len(), 1);
        assert_eq!(fetcher.requests(), 1);
    }

    #[tokio::test]
    async fn test_redirect_target_scheduled() {
        let fetcher = StaticFetcher::new()
            .redirect(
                "http://example.com/old",
                "http://example.com/new",
                r#"<a href="/child">c</a>"#,
            )
            .html("http://example.com/new", r#"<a href="/child">c</a>"#)
            .html("http://example.com/child", "<p></p>");
        let (crawler, _) = crawler(&["http://example.com/old"], &[], fetcher, 2);

        let site = crawler.crawl().await.unwrap();

        let old = site.page(&url("http://example.com/old")).unwrap();
        assert!(old.is_redirect);
        assert!(site.page(&url("http://example.com/new")).is_some());
        assert!(site.page(&url("http://example.com/child")).is_some());
        assert_eq!(site.len(), 3);
    }

    #[tokio::test]
    async fn test_redirect_out_of_scope_links_not_followed() {
        let fetcher = StaticFetcher::new()
            .redirect(
                "http://example.com/away",
                "http://other.org/landing",
                r#"<a href="http://other.org/deeper">d</a>"#,
            )
            .html("http://other.org/landing", "<p></p>");
        let (crawler, fetcher) = crawler(&["http://example.com/away"], &[], fetcher, 1);

        let site = crawler.crawl().await.unwrap();

        assert!(site.page(&url("http://other.org/deeper")).is_none());
        let landing = site.page(&url("http://other.org/landing")).unwrap();
        assert!(!landing.is_local);
        assert_eq!(fetcher.requests(), 2);
    }

    #[tokio::test]
    async fn test_accepted_hosts_are_expanded() {
        let fetcher = StaticFetcher::new()
            .html("http://example.com/", r#"<a href="http://docs.example.org/">docs</a>"#)
            .html("http://docs.example.org/", r#"<a href="/guide">guide</a>"#)
            .html("http://docs.example.org/guide", "<p></p>");
        let (crawler, _) = crawler(&["http://example.com/"], &["*.example.org"], fetcher, 2);

        let site = crawler.crawl().await.unwrap();

        assert_eq!(site.len(), 3);
        assert!(site.page(&url("http://docs.example.org/")).unwrap().is_local);
    }

    #[tokio::test]
    async fn test_unreachable_seed_recorded_as_error() {
        let (crawler, _) = crawler(&["http://down.example/"], &[], StaticFetcher::new(), 2);

        let site = crawler.crawl().await.unwrap();

        assert_eq!(site.len(), 1);
        assert_eq!(site.error_count(), 1);
    }

    #[tokio::test]
    async fn test_no_seeds_is_config_error() {
        let (crawler, _) = crawler(&[], &["example.com"], StaticFetcher::new(), 2);
        assert!(matches!(
            crawler.crawl().await,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_no_hosts_is_config_error() {
        let (crawler, _) = crawler(&["ftp://example.com/"], &[], StaticFetcher::new(), 2);
        assert!(matches!(
            crawler.crawl().await,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_zero_workers_is_config_error() {
        let (crawler, fetcher) = crawler(&["http://example.com/"], &[], small_site(), 0);
        assert!(matches!(
            crawler.crawl().await,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
        assert_eq!(fetcher.requests(), 0);
    }

    #[tokio::test]
    async fn test_zero_timeout_is_config_error() {
        let mut config = Config::default();
        config.scope.seeds = vec!["http://example.com/".to_string()];
        config.crawler.timeout_secs = -1.0;
        assert_eq!(config.crawler.timeout(), Duration::ZERO);

        let crawler = SiteCrawler::from_config(&config).unwrap();
        assert!(matches!(
            crawler.crawl().await,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));

        let fetcher = Arc::new(small_site());
        let crawler = SiteCrawler::new(
            ScopeConfig::new(["http://example.com/"], Vec::<String>::new()),
            WorkerConfig {
                timeout: Duration::ZERO,
                ..WorkerConfig::default()
            },
            2,
            Box::new(TaskBackend),
            fetcher.clone(),
        );
        assert!(crawler.crawl().await.is_err());
        assert_eq!(fetcher.requests(), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.scope.seeds = vec!["http://example.com/".to_string()];
        config.crawler.workers = 2;

        let crawler = SiteCrawler::from_config(&config).unwrap();
        assert_eq!(crawler.workers, 2);
        assert_eq!(crawler.backend.name(), "thread");
        assert_eq!(crawler.output_capacity, 64);
    }
}
