//! Per-page crawl records
//!
//! A [`PageCrawl`] is what a worker reports back for one work item. Every
//! failure below the coordinator is captured here rather than propagated.

use crate::url::UrlSplit;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// The kind of element a link was discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum LinkType {
    /// `<a href="...">`
    #[serde(rename = "a")]
    Anchor,
    /// `<img src="...">`
    #[serde(rename = "img")]
    Image,
    /// `<script src="...">`
    #[serde(rename = "script")]
    Script,
    /// `<link href="...">`, usually a stylesheet
    #[serde(rename = "link")]
    Stylesheet,
}

impl LinkType {
    /// Every supported link type, in the order they are reported
    pub const ALL: [LinkType; 4] = [
        LinkType::Anchor,
        LinkType::Image,
        LinkType::Script,
        LinkType::Stylesheet,
    ];

    /// The HTML tag name for this link type
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Anchor => "a",
            Self::Image => "img",
            Self::Script => "script",
            Self::Stylesheet => "link",
        }
    }

    /// The attribute carrying the link target
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Anchor | Self::Stylesheet => "href",
            Self::Image | Self::Script => "src",
        }
    }

    /// CSS selector matching elements of this type that carry a target
    pub fn selector(&self) -> String {
        format!("{}[{}]", self.tag(), self.attribute())
    }

    /// Looks up a link type by tag name (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A reference discovered on a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    /// Element the reference was found in
    pub link_type: LinkType,
    /// Page the reference was found on
    pub source: UrlSplit,
    /// Absolute, canonical target
    pub target: UrlSplit,
}

/// Why a fetch did not produce a healthy response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("HTTP {status}")]
    Http { status: u16 },
}

/// Why link extraction could not fully process a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("HTML body could not be read")]
    MissingBody,

    #[error("Invalid <base href>: {0}")]
    InvalidBase(String),
}

/// Result of crawling one work item
#[derive(Debug, Clone, PartialEq)]
pub struct PageCrawl {
    /// URL that was requested
    pub url: UrlSplit,

    /// URL of the final response after redirects
    pub final_url: Option<UrlSplit>,

    /// HTTP status of the final response; `None` on total failure
    pub status: Option<u16>,

    /// Response was an HTML document
    pub is_html: bool,

    /// Fetch hit the configured timeout
    pub is_timeout: bool,

    /// Final URL differs from the requested one
    pub is_redirect: bool,

    /// Page was in scope and dispatched for link extraction
    pub is_local: bool,

    /// Fetch-level failure, if any
    pub failure: Option<FetchFailure>,

    /// Parse-level failure, if any
    pub parse_failure: Option<ParseFailure>,

    /// Links discovered on the page, in document order
    pub links: Vec<Link>,
}

impl PageCrawl {
    /// Creates a record with no response data
    pub fn new(url: UrlSplit, is_local: bool) -> Self {
        Self {
            url,
            final_url: None,
            status: None,
            is_html: false,
            is_timeout: false,
            is_redirect: false,
            is_local,
            failure: None,
            parse_failure: None,
            links: Vec::new(),
        }
    }

    /// The URL links on this page are relative to
    pub fn effective_url(&self) -> &UrlSplit {
        self.final_url.as_ref().unwrap_or(&self.url)
    }

    /// Returns true if this page belongs in the site's error view
    ///
    /// A page is an error when it has no status, a status outside 200-399,
    /// timed out, or captured any failure.
    pub fn is_error(&self) -> bool {
        let status_ok = matches!(self.status, Some(200..=399));
        !status_ok || self.is_timeout || self.failure.is_some() || self.parse_failure.is_some()
    }

    /// Human-readable reason for an error page
    pub fn error_reason(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }

        let mut reasons = Vec::new();
        if let Some(failure) = &self.failure {
            reasons.push(failure.to_string());
        } else if let Some(status) = self.status {
            reasons.push(format!("HTTP {}", status));
        }
        if let Some(parse) = &self.parse_failure {
            reasons.push(parse.to_string());
        }
        if reasons.is_empty() {
            reasons.push("No response".to_string());
        }
        Some(reasons.join("; "))
    }
}
