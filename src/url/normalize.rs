use crate::UrlError;
use std::fmt;
use url::Url;

/// Scheme assumed when a raw URL does not carry one
pub const DEFAULT_SCHEME: &str = "http";

/// A canonical, fragment-free URL
///
/// Every URL that enters the frontier or the site aggregate is a `UrlSplit`
/// produced by [`normalize`] or [`resolve`]. The host is lowercase, a default
/// port is stripped, the path is at least `/`, and there is never a fragment,
/// so two splits compare equal exactly when they address the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlSplit {
    url: Url,
}

impl UrlSplit {
    /// The URL scheme (`http` or `https`)
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// The lowercase host
    pub fn host(&self) -> &str {
        // Construction guarantees a host is present
        self.url.host_str().unwrap_or_default()
    }

    /// The explicit port, `None` when it is the scheme's default
    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// The path, never empty
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The query string without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// The full canonical URL string
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    fn from_url(mut url: Url) -> Result<Self, UrlError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(UrlError::MissingHost(url.to_string())),
        }

        url.set_fragment(None);

        // An empty query (`page?`) addresses the same resource as no query
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(Self { url })
    }
}

impl fmt::Display for UrlSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl std::str::FromStr for UrlSplit {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

/// Normalizes a raw URL string into a [`UrlSplit`]
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. A protocol-relative input (`//host/path`) gets the default scheme
/// 3. An input without `://` is treated as a bare host and gets the default scheme
/// 4. Lowercase the host and strip the scheme's default port
/// 5. Ensure the path is at least `/`
/// 6. Drop the fragment
///
/// # Returns
///
/// * `Ok(UrlSplit)` - Canonical URL
/// * `Err(UrlError)` - No host could be derived, or the scheme is not HTTP(S)
///
/// # Examples
///
/// ```
/// use sitecheck::url::normalize;
///
/// let url = normalize("WWW.Example.com:80/page#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.example.com/page");
/// ```
pub fn normalize(raw: &str) -> Result<UrlSplit, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Malformed("empty URL".to_string()));
    }

    let candidate = if raw.starts_with("//") {
        format!("{}:{}", DEFAULT_SCHEME, raw)
    } else if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    let url = Url::parse(&candidate).map_err(|e| match e {
        url::ParseError::EmptyHost => UrlError::MissingHost(raw.to_string()),
        other => UrlError::Malformed(format!("{}: {}", raw, other)),
    })?;

    UrlSplit::from_url(url)
}

/// Resolves a (possibly relative) reference against a base URL
///
/// Follows RFC 3986 reference resolution:
/// - `//host/path` keeps the base scheme and replaces host and path
/// - `/path` keeps the base scheme and host
/// - `path` and `../path` resolve against the base directory
/// - absolute references replace the base entirely
///
/// The reference's fragment is dropped and the result is canonical.
///
/// # Examples
///
/// ```
/// use sitecheck::url::{normalize, resolve};
///
/// let base = normalize("https://www.example.com/hello/index.html").unwrap();
/// let url = resolve("../test.html", &base).unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/test.html");
/// ```
pub fn resolve(reference: &str, base: &UrlSplit) -> Result<UrlSplit, UrlError> {
    let reference = reference.trim();
    let joined = base
        .as_url()
        .join(reference)
        .map_err(|e| UrlError::Malformed(format!("{}: {}", reference, e)))?;

    UrlSplit::from_url(joined)
}
