use crate::url::normalize::{normalize, UrlSplit};
use std::collections::BTreeSet;

/// Seed URLs plus the set of hosts whose pages are explored
///
/// Hosts are stored in their bare form (lowercase, no `www.` prefix), so
/// `www.example.com` and `example.com` are interchangeable. The host of every
/// seed URL is accepted automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeConfig {
    seeds: Vec<String>,
    accepted_hosts: BTreeSet<String>,
}

impl ScopeConfig {
    /// Builds a scope from raw seed strings and host patterns
    ///
    /// Seeds that fail to normalize contribute no host; the coordinator logs
    /// and skips them when seeding the frontier.
    pub fn new<S, H>(seeds: S, accepted_hosts: H) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        let seeds: Vec<String> = seeds.into_iter().map(Into::into).collect();

        let mut hosts: BTreeSet<String> = accepted_hosts
            .into_iter()
            .map(|h| bare_host(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();

        for seed in &seeds {
            if let Ok(url) = normalize(seed) {
                hosts.insert(bare_host(url.host()));
            }
        }

        Self {
            seeds,
            accepted_hosts: hosts,
        }
    }

    /// The raw seed URLs, in configuration order
    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    /// The accepted host patterns in bare form
    pub fn accepted_hosts(&self) -> impl Iterator<Item = &str> {
        self.accepted_hosts.iter().map(String::as_str)
    }

    /// Returns true if pages on `host` should be parsed for further links
    ///
    /// # Examples
    ///
    /// ```
    /// use sitecheck::url::ScopeConfig;
    ///
    /// let scope = ScopeConfig::new(["http://www.example.com/"], ["*.example.org"]);
    /// assert!(scope.is_in_scope("example.com"));
    /// assert!(scope.is_in_scope("WWW.EXAMPLE.COM"));
    /// assert!(scope.is_in_scope("docs.example.org"));
    /// assert!(!scope.is_in_scope("cdn.example.com"));
    /// ```
    pub fn is_in_scope(&self, host: &str) -> bool {
        let candidate = bare_host(host);
        self.accepted_hosts
            .iter()
            .any(|pattern| matches_wildcard(pattern, &candidate))
    }

    /// Returns true if the URL's host is in scope
    pub fn contains(&self, url: &UrlSplit) -> bool {
        self.is_in_scope(url.host())
    }
}

/// Lowercases a host and strips a leading `www.`
fn bare_host(host: &str) -> String {
    let host = host.trim().to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Checks if a host matches a host pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// # Examples
///
/// ```
/// use sitecheck::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}
