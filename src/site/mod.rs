//! Site aggregate
//!
//! The [`Site`] holds every page crawled during one run. It is owned and
//! mutated by the coordinator alone and handed out read-only once the crawl
//! finishes.

mod page;

pub use page::{FetchFailure, Link, LinkType, PageCrawl, ParseFailure};

use crate::url::UrlSplit;
use std::collections::HashMap;

/// All crawl results of one run, keyed by requested URL
#[derive(Debug, Clone, Default)]
pub struct Site {
    pages: HashMap<UrlSplit, PageCrawl>,
}

impl Site {
    /// Creates an empty site
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a crawled page
    ///
    /// Pages are append-only: returns false and keeps the existing record if
    /// the URL was already recorded.
    pub fn add_page(&mut self, page: PageCrawl) -> bool {
        if self.pages.contains_key(&page.url) {
            tracing::warn!("Ignoring duplicate result for {}", page.url);
            return false;
        }
        self.pages.insert(page.url.clone(), page);
        true
    }

    /// All crawled pages
    pub fn pages(&self) -> &HashMap<UrlSplit, PageCrawl> {
        &self.pages
    }

    /// Looks up the record for a URL
    pub fn page(&self, url: &UrlSplit) -> Option<&PageCrawl> {
        self.pages.get(url)
    }

    /// Pages that failed, derived from each page's own status and flags
    pub fn error_pages(&self) -> impl Iterator<Item = &PageCrawl> {
        self.pages.values().filter(|page| page.is_error())
    }

    /// Number of error pages
    pub fn error_count(&self) -> usize {
        self.error_pages().count()
    }

    /// Number of crawled pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if nothing was crawled
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages that link to `target`, sorted and deduplicated
    pub fn referrers(&self, target: &UrlSplit) -> Vec<&UrlSplit> {
        let mut sources: Vec<&UrlSplit> = self
            .pages
            .values()
            .filter(|page| page.links.iter().any(|link| &link.target == target))
            .map(|page| &page.url)
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }
}
