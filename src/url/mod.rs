//! URL handling module for sitecheck
//!
//! This module provides URL normalization, reference resolution and host
//! scope matching. Everything here is pure: no I/O.

mod normalize;
mod scope;

pub use normalize::{normalize, resolve, UrlSplit, DEFAULT_SCHEME};
pub use scope::{matches_wildcard, ScopeConfig};
