//! Sitecheck: a concurrent website link checker
//!
//! This crate crawls a set of seed pages, follows hyperlinks within an accepted
//! set of hosts, and verifies that every discovered resource (pages, images,
//! scripts, stylesheets) is reachable. The result is a [`Site`] holding every
//! crawled page plus a derived view of the broken ones.

pub mod config;
pub mod crawler;
pub mod output;
pub mod site;
pub mod url;

use thiserror::Error;

/// Main error type for sitecheck operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} channel closed while work was still outstanding")]
    ChannelClosed(&'static str),

    #[error("Failed to start worker {worker}: {message}")]
    WorkerSpawn { worker: usize, message: String },

    #[error("Worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("Failed to join worker {worker}: {message}")]
    WorkerJoin { worker: usize, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for sitecheck operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{SiteCrawler, WorkerConfig};
pub use crate::site::{Link, LinkType, PageCrawl, Site};
pub use crate::url::{normalize, resolve, ScopeConfig, UrlSplit};
