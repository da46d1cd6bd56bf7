//! HTML link extraction
//!
//! This module turns an HTML body into typed [`Link`]s:
//! - `<a href>`, `<img src>`, `<script src>` and `<link href>` elements,
//!   filtered by the configured link types
//! - References resolve against `<base href>` when the page declares one,
//!   otherwise against the page's own URL
//!
//! **Excluded references:**
//! - empty and fragment-only references (same page anchors)
//! - `javascript:`, `mailto:`, `tel:` and `data:` references
//! - references that do not normalize to an HTTP(S) URL

use crate::site::{Link, LinkType, ParseFailure};
use crate::url::{resolve, UrlSplit};
use scraper::{Html, Selector};
use serde::Deserialize;

/// Schemes that never point at a checkable resource
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// HTML parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Parse the body as a complete document
    #[default]
    Document,
    /// Parse the body as a fragment, for servers returning partial markup
    Fragment,
}

impl ParserKind {
    fn parse(&self, html: &str) -> Html {
        match self {
            Self::Document => Html::parse_document(html),
            Self::Fragment => Html::parse_fragment(html),
        }
    }
}

/// Links extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Links in document order
    pub links: Vec<Link>,

    /// Set when extraction could only partially complete
    pub failure: Option<ParseFailure>,
}

/// Extracts typed links from HTML bodies
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    types: Vec<LinkType>,
    parser: ParserKind,
    selector: Option<Selector>,
}

impl LinkExtractor {
    /// Creates an extractor for the given link types
    pub fn new(types: &[LinkType], parser: ParserKind) -> Self {
        let mut types = types.to_vec();
        types.sort();
        types.dedup();

        let selector = if types.is_empty() {
            None
        } else {
            let query = types
                .iter()
                .map(LinkType::selector)
                .collect::<Vec<_>>()
                .join(", ");
            Selector::parse(&query).ok()
        };

        Self {
            types,
            parser,
            selector,
        }
    }

    /// The link types this extractor looks for
    pub fn types(&self) -> &[LinkType] {
        &self.types
    }

    /// Parses `html` and extracts its links
    ///
    /// # Arguments
    ///
    /// * `html` - The HTML content to parse
    /// * `source` - The page the links are attributed to
    /// * `document_url` - The URL the body was served from, used to resolve
    ///   relative references when there is no `<base href>`
    ///
    /// # Example
    ///
    /// ```
    /// use sitecheck::crawler::{LinkExtractor, ParserKind};
    /// use sitecheck::site::LinkType;
    /// use sitecheck::url::normalize;
    ///
    /// let page = normalize("http://www.example.com/alone.html").unwrap();
    /// let extractor = LinkExtractor::new(&LinkType::ALL, ParserKind::Document);
    /// let parsed = extractor.extract(r#"<a href="test.html">x</a>"#, &page, &page);
    /// assert_eq!(parsed.links[0].target.as_str(), "http://www.example.com/test.html");
    /// ```
    pub fn extract(&self, html: &str, source: &UrlSplit, document_url: &UrlSplit) -> ParsedPage {
        let mut parsed = ParsedPage::default();

        let Some(selector) = &self.selector else {
            return parsed;
        };

        let document = self.parser.parse(html);

        let base = match find_base_href(&document) {
            Some(href) => match resolve(href, document_url) {
                Ok(base) => base,
                Err(e) => {
                    tracing::debug!("Ignoring <base href> on {}: {}", source, e);
                    parsed.failure = Some(ParseFailure::InvalidBase(href.to_string()));
                    document_url.clone()
                }
            },
            None => document_url.clone(),
        };

        for element in document.select(selector) {
            let Some(link_type) = LinkType::from_tag(element.value().name()) else {
                continue;
            };

            let Some(reference) = element.value().attr(link_type.attribute()) else {
                continue;
            };

            if should_skip(reference) {
                continue;
            }

            match resolve(reference, &base) {
                Ok(target) => parsed.links.push(Link {
                    link_type,
                    source: source.clone(),
                    target,
                }),
                Err(e) => {
                    tracing::debug!("Skipping link {:?} on {}: {}", reference, source, e);
                }
            }
        }

        tracing::debug!("Extracted {} links from {}", parsed.links.len(), source);
        parsed
    }
}

/// Returns the first `<base href>` value, if any
fn find_base_href(document: &Html) -> Option<&str> {
    let selector = Selector::parse("base[href]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
}

/// Returns true for references that are never checked
fn should_skip(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return true;
    }

    let lower = reference.to_ascii_lowercase();
    SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}
