//! Output module for crawl reports
//!
//! This module handles:
//! - Summarizing a crawled site into statistics
//! - Printing the console report
//! - Writing the markdown report

mod console;
mod markdown;
pub mod stats;

pub use console::{write_report, write_statistics};
pub use markdown::{format_markdown_report, generate_markdown_report, ReportInfo};
pub use stats::CrawlStatistics;
