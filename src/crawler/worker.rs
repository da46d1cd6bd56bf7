//! Page crawler workers
//!
//! A [`PageCrawler`] consumes [`WorkerInput`] from the shared input channel,
//! fetches each URL, extracts links from in-scope HTML pages and emits one
//! [`PageCrawl`] per work item on the output channel. It stops when it
//! receives [`WorkerInput::Shutdown`] or the input channel closes.

use crate::crawler::fetcher::{Credentials, PageFetcher};
use crate::crawler::parser::{LinkExtractor, ParserKind};
use crate::site::{FetchFailure, LinkType, PageCrawl, ParseFailure};
use crate::url::UrlSplit;
use kanal::{AsyncReceiver, AsyncSender};
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One URL to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: UrlSplit,

    /// Extract and report links from this page
    pub should_expand: bool,
}

/// Message on the worker input channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerInput {
    Work(WorkItem),
    /// Stop after the current item; exactly one per worker is sent
    Shutdown,
}

/// Lifecycle of a worker, traced as it changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Fetching,
    Parsing,
    Emitting,
    Stopped,
}

/// Settings shared read-only by every worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub credentials: Option<Credentials>,
    pub link_types: Vec<LinkType>,
    pub timeout: Duration,
    pub parser: ParserKind,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            link_types: LinkType::ALL.to_vec(),
            timeout: DEFAULT_TIMEOUT,
            parser: ParserKind::default(),
        }
    }
}

/// A worker that crawls pages until told to stop
pub struct PageCrawler {
    id: usize,
    config: Arc<WorkerConfig>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: LinkExtractor,
    input: AsyncReceiver<WorkerInput>,
    output: AsyncSender<PageCrawl>,
    state: WorkerState,
}

impl PageCrawler {
    pub fn new(
        id: usize,
        config: Arc<WorkerConfig>,
        fetcher: Arc<dyn PageFetcher>,
        input: AsyncReceiver<WorkerInput>,
        output: AsyncSender<PageCrawl>,
    ) -> Self {
        let extractor = LinkExtractor::new(&config.link_types, config.parser);
        Self {
            id,
            config,
            fetcher,
            extractor,
            input,
            output,
            state: WorkerState::Idle,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the worker loop and returns the number of pages emitted
    pub async fn run(mut self) -> usize {
        tracing::debug!("Worker {} started", self.id);
        let mut emitted = 0;

        loop {
            self.set_state(WorkerState::Idle);
            let item = match self.input.recv().await {
                Ok(WorkerInput::Work(item)) => item,
                Ok(WorkerInput::Shutdown) => break,
                Err(_) => {
                    tracing::debug!("Worker {} input closed", self.id);
                    break;
                }
            };

            let page = self.crawl_page(item).await;

            self.set_state(WorkerState::Emitting);
            if self.output.send(page).await.is_err() {
                tracing::warn!("Worker {} output closed, stopping", self.id);
                break;
            }
            emitted += 1;
        }

        self.set_state(WorkerState::Stopped);
        tracing::debug!("Worker {} stopped after {} pages", self.id, emitted);
        emitted
    }

    /// Fetches one item and builds its crawl record
    ///
    /// Links are only extracted for HTML responses of items marked
    /// `should_expand` that did not fail with an HTTP error status.
    pub async fn crawl_page(&mut self, item: WorkItem) -> PageCrawl {
        self.set_state(WorkerState::Fetching);

        // Pages that are only checked never need their body
        let outcome = self
            .fetcher
            .fetch(
                &item.url,
                self.config.timeout,
                self.config.credentials.as_ref(),
                item.should_expand,
            )
            .await;

        let mut page = PageCrawl::new(item.url, item.should_expand);
        page.is_html = outcome.is_html();
        page.status = outcome.status;
        page.final_url = outcome.final_url;
        page.is_redirect = outcome.is_redirect;
        page.is_timeout = outcome.is_timeout;
        page.failure = outcome.failure;

        let http_failure = matches!(page.failure, Some(FetchFailure::Http { .. }));
        if !page.is_html || !item.should_expand || http_failure {
            return page;
        }

        self.set_state(WorkerState::Parsing);
        match outcome.body {
            Some(body) => {
                let document_url = page.effective_url().clone();
                let parsed = self.extractor.extract(&body, &page.url, &document_url);
                page.links = parsed.links;
                page.parse_failure = parsed.failure;
            }
            None => page.parse_failure = Some(ParseFailure::MissingBody),
        }

        page
    }

    fn set_state(&mut self, state: WorkerState) {
        if self.state != state {
            tracing::trace!("Worker {}: {:?} -> {:?}", self.id, self.state, state);
            self.state = state;
        }
    }
}
