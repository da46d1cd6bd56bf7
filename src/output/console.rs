//! Plain-text crawl report
//!
//! Error pages come first, each with the reason it failed and the pages
//! that link to it, followed by the statistics block.

use crate::output::stats::CrawlStatistics;
use crate::site::{PageCrawl, Site};
use std::io::{self, Write};

/// Pages sorted by URL, so reports are stable across runs
pub(crate) fn sorted_pages<'a>(pages: impl Iterator<Item = &'a PageCrawl>) -> Vec<&'a PageCrawl> {
    let mut pages: Vec<&PageCrawl> = pages.collect();
    pages.sort_by(|a, b| a.url.cmp(&b.url));
    pages
}

/// Short status column: the HTTP code, or `---` without a response
pub(crate) fn status_label(page: &PageCrawl) -> String {
    match page.status {
        Some(status) => status.to_string(),
        None => "---".to_string(),
    }
}

/// Writes the report for a crawled site
///
/// # Arguments
///
/// * `site` - The crawled site
/// * `show_all` - List healthy pages as well as error pages
/// * `out` - Where the report is written
pub fn write_report<W: Write>(site: &Site, show_all: bool, out: &mut W) -> io::Result<()> {
    let stats = CrawlStatistics::from_site(site);
    let errors = sorted_pages(site.error_pages());

    if errors.is_empty() {
        writeln!(out, "No broken links found.")?;
    } else {
        writeln!(out, "Error pages ({}):", errors.len())?;
        for page in &errors {
            let reason = page.error_reason().unwrap_or_default();
            writeln!(out, "  [{}] {}", status_label(page), page.url)?;
            writeln!(out, "        {}", reason)?;
            for referrer in site.referrers(&page.url) {
                writeln!(out, "        linked from {}", referrer)?;
            }
        }
    }
    writeln!(out)?;

    if show_all {
        let healthy = sorted_pages(site.pages().values().filter(|p| !p.is_error()));
        writeln!(out, "Healthy pages ({}):", healthy.len())?;
        for page in healthy {
            let mut line = format!("  [{}] {}", status_label(page), page.url);
            if page.is_redirect {
                if let Some(final_url) = &page.final_url {
                    line.push_str(&format!(" -> {}", final_url));
                }
            }
            if !page.is_local {
                line.push_str(" (external)");
            }
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
    }

    write_statistics(&stats, out)
}

/// Writes the statistics block
pub fn write_statistics<W: Write>(stats: &CrawlStatistics, out: &mut W) -> io::Result<()> {
    writeln!(out, "=== Crawl Statistics ===")?;
    writeln!(
        out,
        "  Pages checked: {} ({} local, {} external)",
        stats.total_pages, stats.local_pages, stats.external_pages
    )?;
    writeln!(out, "  Unique hosts: {}", stats.unique_hosts)?;
    writeln!(out, "  Links found: {}", stats.total_links)?;
    writeln!(out, "  Redirects: {}", stats.redirects)?;
    writeln!(out, "  Timeouts: {}", stats.timeouts)?;
    writeln!(
        out,
        "  Error pages: {} ({:.1}%)",
        stats.error_pages,
        stats.error_rate()
    )?;

    if !stats.status_counts.is_empty() || stats.no_response > 0 {
        writeln!(out, "  Status codes:")?;
        for (status, count) in &stats.status_counts {
            writeln!(out, "    {}: {}", status, count)?;
        }
        if stats.no_response > 0 {
            writeln!(out, "    no response: {}", stats.no_response)?;
        }
    }

    Ok(())
}
