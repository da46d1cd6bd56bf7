//! In-memory fetcher for crawler tests

use crate::crawler::fetcher::{Credentials, FetchOutcome, PageFetcher};
use crate::site::FetchFailure;
use crate::url::{normalize, UrlSplit};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves canned outcomes keyed by URL; anything else is refused
#[derive(Default)]
pub(crate) struct StaticFetcher {
    pages: HashMap<String, FetchOutcome>,
    requests: AtomicUsize,
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn html(self, url: &str, body: &str) -> Self {
        let outcome = FetchOutcome {
            status: Some(200),
            final_url: normalize(url).ok(),
            content_type: Some("text/html".to_string()),
            body: Some(body.to_string()),
            ..FetchOutcome::default()
        };
        self.outcome(url, outcome)
    }

    pub(crate) fn asset(self, url: &str, content_type: &str) -> Self {
        let outcome = FetchOutcome {
            status: Some(200),
            final_url: normalize(url).ok(),
            content_type: Some(content_type.to_string()),
            ..FetchOutcome::default()
        };
        self.outcome(url, outcome)
    }

    pub(crate) fn not_found(self, url: &str) -> Self {
        let outcome = FetchOutcome {
            status: Some(404),
            final_url: normalize(url).ok(),
            content_type: Some("text/html".to_string()),
            failure: Some(FetchFailure::Http { status: 404 }),
            ..FetchOutcome::default()
        };
        self.outcome(url, outcome)
    }

    /// A redirect already followed by the transport, landing on an HTML page
    pub(crate) fn redirect(self, url: &str, location: &str, body: &str) -> Self {
        let outcome = FetchOutcome {
            status: Some(200),
            final_url: normalize(location).ok(),
            is_redirect: true,
            content_type: Some("text/html".to_string()),
            body: Some(body.to_string()),
            ..FetchOutcome::default()
        };
        self.outcome(url, outcome)
    }

    pub(crate) fn outcome(mut self, url: &str, outcome: FetchOutcome) -> Self {
        self.pages.insert(url.to_string(), outcome);
        self
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(
        &self,
        url: &UrlSplit,
        _timeout: Duration,
        _credentials: Option<&Credentials>,
        read_body: bool,
    ) -> FetchOutcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut outcome = self
            .pages
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| FetchOutcome::transport("Connection refused"));
        if !read_body {
            outcome.body = None;
        }
        outcome
    }
}

/// Starts a server that sends HTML headers promising a large body, then stalls
///
/// Returns the server's root URL.
pub(crate) async fn stalled_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\n\
                          Content-Type: text/html\r\n\
                          Content-Length: 100000\r\n\r\n<html>",
                    )
                    .await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    format!("http://{}/", addr)
}
