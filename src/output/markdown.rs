//! Markdown report generation
//!
//! This module generates a human-readable markdown report of a crawl,
//! including statistics, error pages with their referrers, and redirects.

use crate::output::console::{sorted_pages, status_label};
use crate::output::stats::CrawlStatistics;
use crate::site::Site;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Context printed in the report header
#[derive(Debug, Clone)]
pub struct ReportInfo {
    pub generated_at: DateTime<Utc>,
    pub seeds: Vec<String>,
    pub config_hash: Option<String>,
}

impl ReportInfo {
    /// Header for a report generated now
    pub fn now(seeds: Vec<String>, config_hash: Option<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            seeds,
            config_hash,
        }
    }
}

/// Writes a markdown report for a crawled site
///
/// # Arguments
///
/// * `site` - The crawled site
/// * `info` - Header information for the report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(io::Error)` - Failed to write the report
pub fn generate_markdown_report(site: &Site, info: &ReportInfo, output_path: &Path) -> io::Result<()> {
    let markdown = format_markdown_report(site, info);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(site: &Site, info: &ReportInfo) -> String {
    let stats = CrawlStatistics::from_site(site);
    let mut md = String::new();

    md.push_str("# Sitecheck Report\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        info.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    for seed in &info.seeds {
        md.push_str(&format!("- **Seed**: {}\n", seed));
    }
    if let Some(hash) = &info.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Checked**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Local Pages**: {}\n", stats.local_pages));
    md.push_str(&format!("- **External Pages**: {}\n", stats.external_pages));
    md.push_str(&format!("- **Unique Hosts**: {}\n", stats.unique_hosts));
    md.push_str(&format!("- **Total Links**: {}\n", stats.total_links));
    md.push_str(&format!("- **Error Pages**: {}\n", stats.error_pages));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", stats.success_rate()));

    if !stats.status_counts.is_empty() || stats.no_response > 0 {
        md.push_str("## Status Codes\n\n");
        md.push_str("| Status | Pages |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &stats.status_counts {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
        if stats.no_response > 0 {
            md.push_str(&format!("| no response | {} |\n", stats.no_response));
        }
        md.push('\n');
    }

    let errors = sorted_pages(site.error_pages());
    if !errors.is_empty() {
        md.push_str("## Error Pages\n\n");
        md.push_str("| Status | URL | Reason | Linked From |\n");
        md.push_str("|--------|-----|--------|-------------|\n");
        for page in errors {
            let referrers: Vec<String> = site
                .referrers(&page.url)
                .iter()
                .map(|u| u.to_string())
                .collect();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                status_label(page),
                page.url,
                page.error_reason().unwrap_or_default(),
                referrers.join("<br>")
            ));
        }
        md.push('\n');
    }

    let redirects = sorted_pages(site.pages().values().filter(|p| p.is_redirect));
    if !redirects.is_empty() {
        md.push_str("## Redirects\n\n");
        md.push_str("| URL | Final URL |\n");
        md.push_str("|-----|-----------|\n");
        for page in redirects {
            let target = page
                .final_url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_default();
            md.push_str(&format!("| {} | {} |\n", page.url, target));
        }
        md.push('\n');
    }

    md
}
