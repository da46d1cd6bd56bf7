//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `PageFetcher` capability the workers call
//! - Building the reqwest client with the crawler's user agent
//! - Classifying responses into status, redirect, timeout and failure
//!
//! One call issues one request. Nothing is retried.

use crate::site::FetchFailure;
use crate::url::{normalize, UrlSplit};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use serde::Deserialize;
use std::time::Duration;

/// Maximum redirect hops the transport follows before failing
pub const MAX_REDIRECTS: usize = 10;

/// Static credentials sent as HTTP basic auth
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Classified result of a single fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// HTTP status of the final response; `None` when no response arrived
    pub status: Option<u16>,

    /// URL of the final response after redirects
    pub final_url: Option<UrlSplit>,

    /// Final URL differs from the requested URL
    pub is_redirect: bool,

    /// The request or body read hit the timeout
    pub is_timeout: bool,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Decoded body, only read for HTML responses the caller will parse
    pub body: Option<String>,

    /// Failure captured during the fetch
    pub failure: Option<FetchFailure>,
}

impl FetchOutcome {
    /// Outcome of a request that timed out before any response
    pub fn timeout() -> Self {
        Self {
            is_timeout: true,
            failure: Some(FetchFailure::Timeout),
            ..Self::default()
        }
    }

    /// Outcome of a request that failed below HTTP
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            failure: Some(FetchFailure::Transport(message.into())),
            ..Self::default()
        }
    }

    /// Returns true if the Content-Type denotes an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_html_content_type)
    }
}

/// Returns true for `text/html` and `application/xhtml+xml`, ignoring parameters
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Capability for fetching one URL
///
/// Implementations never return errors: every failure is classified into
/// the returned [`FetchOutcome`]. The body of an HTML response is read only
/// when `read_body` is set; otherwise the response is dropped after its
/// headers arrive.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &UrlSplit,
        timeout: Duration,
        credentials: Option<&Credentials>,
        read_body: bool,
    ) -> FetchOutcome;
}

/// Builds an HTTP client with the crawler's configuration
///
/// Redirects are followed by the transport (up to [`MAX_REDIRECTS`] hops);
/// the per-request timeout, which also bounds connecting, is applied by
/// [`HttpFetcher`].
///
/// # Example
///
/// ```no_run
/// use sitecheck::crawler::build_http_client;
///
/// let client = build_http_client("sitecheck/0.1").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `PageFetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built by [`build_http_client`]
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &UrlSplit,
        timeout: Duration,
        credentials: Option<&Credentials>,
        read_body: bool,
    ) -> FetchOutcome {
        let mut request = self.client.get(url.as_str()).timeout(timeout);
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_error(url, &e),
        };

        let status = response.status();
        let final_url = normalize(response.url().as_str()).ok();
        let is_redirect = final_url.as_ref().is_some_and(|final_url| final_url != url);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut outcome = FetchOutcome {
            status: Some(status.as_u16()),
            final_url,
            is_redirect,
            content_type,
            ..FetchOutcome::default()
        };

        if status.is_client_error() || status.is_server_error() {
            tracing::debug!("{} returned HTTP {}", url, status.as_u16());
            outcome.failure = Some(FetchFailure::Http {
                status: status.as_u16(),
            });
            return outcome;
        }

        if read_body && outcome.is_html() {
            match response.text().await {
                Ok(body) => outcome.body = Some(body),
                Err(e) if e.is_timeout() => {
                    tracing::debug!("Timed out reading body of {}", url);
                    outcome.is_timeout = true;
                    outcome.failure = Some(FetchFailure::Timeout);
                }
                Err(e) => {
                    tracing::debug!("Failed to read body of {}: {}", url, e);
                    outcome.failure = Some(FetchFailure::Transport(e.to_string()));
                }
            }
        }

        outcome
    }
}

/// Maps a reqwest error without a response to an outcome
fn classify_error(url: &UrlSplit, error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        tracing::debug!("Request to {} timed out", url);
        FetchOutcome::timeout()
    } else if error.is_connect() {
        tracing::debug!("Connection to {} failed: {}", url, error);
        FetchOutcome::transport(format!("Connection failed: {}", error))
    } else if error.is_redirect() {
        FetchOutcome::transport(format!("Redirect error: {}", error))
    } else {
        FetchOutcome::transport(error.to_string())
    }
}
