//! Statistics derived from a crawled site
//!
//! This module summarizes a [`Site`] into the counters shown at the end of a
//! console report and in the markdown report.

use crate::site::Site;
use std::collections::{BTreeMap, BTreeSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Total number of pages checked
    pub total_pages: usize,

    /// Pages that were in scope and parsed for links
    pub local_pages: usize,

    /// Pages that were only checked
    pub external_pages: usize,

    /// Pages in the error view
    pub error_pages: usize,

    /// Pages whose fetch timed out
    pub timeouts: usize,

    /// Pages whose final URL differs from the requested one
    pub redirects: usize,

    /// Pages that never produced an HTTP status
    pub no_response: usize,

    /// Total number of links discovered
    pub total_links: usize,

    /// Number of unique hosts checked
    pub unique_hosts: usize,

    /// Count of pages by final HTTP status
    pub status_counts: BTreeMap<u16, usize>,
}

impl CrawlStatistics {
    /// Computes statistics for a crawled site
    pub fn from_site(site: &Site) -> Self {
        let mut stats = Self {
            total_pages: site.len(),
            error_pages: site.error_count(),
            ..Self::default()
        };

        let mut hosts = BTreeSet::new();
        for page in site.pages().values() {
            hosts.insert(page.url.host());

            if page.is_local {
                stats.local_pages += 1;
            } else {
                stats.external_pages += 1;
            }
            if page.is_timeout {
                stats.timeouts += 1;
            }
            if page.is_redirect {
                stats.redirects += 1;
            }
            match page.status {
                Some(status) => *stats.status_counts.entry(status).or_insert(0) += 1,
                None => stats.no_response += 1,
            }
            stats.total_links += page.links.len();
        }
        stats.unique_hosts = hosts.len();

        stats
    }

    /// Share of pages that are healthy, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.total_pages - self.error_pages) as f64 / self.total_pages as f64 * 100.0
    }

    /// Share of pages in the error view, in percent
    pub fn error_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        self.error_pages as f64 / self.total_pages as f64 * 100.0
    }
}
