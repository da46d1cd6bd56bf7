//! Configuration module for sitecheck
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitecheck::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitecheck.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScopeSettings};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, parse_config, read_config};
pub use validation::{validate, MAX_WORKERS};
