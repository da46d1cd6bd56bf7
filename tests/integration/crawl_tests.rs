//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end on both worker backends.

use reqwest::redirect::Policy;
use sitecheck::crawler::{
    ConcurrencyMode, Credentials, HttpFetcher, SiteCrawler, WorkerConfig, MAX_REDIRECTS,
};
use sitecheck::site::{FetchFailure, LinkType};
use sitecheck::url::{normalize, ScopeConfig};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher that ignores proxy settings from the environment
fn test_fetcher() -> Arc<HttpFetcher> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()
        .expect("Failed to build client");
    Arc::new(HttpFetcher::with_client(client))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

/// Serves the fixture site
///
/// Eleven resources are reachable from `/index.html`; `/missing.html` is
/// the only broken one. `external` is linked but lives on another host.
async fn mount_fixture_site(site: &MockServer, external: &MockServer) {
    let external_port = external.address().port();

    mount(
        site,
        "/index.html",
        html(format!(
            r##"<!DOCTYPE html>
<html>
<head>
    <link rel="stylesheet" href="/css/style.css">
    <script src="/js/app.js"></script>
</head>
<body>
    <a href="a.html">A</a>
    <a href="sub/b.html">B</a>
    <a href="/missing.html">Missing</a>
    <a href="http://localhost:{}/external.html">External</a>
    <a href="index.html#top">Top</a>
    <a href="#top">Same page</a>
    <a href="mailto:webmaster@example.com">Mail</a>
    <img src="sub/small_image.gif">
</body>
</html>"##,
            external_port
        )),
        1,
    )
    .await;

    mount(
        site,
        "/a.html",
        html(r#"<a href="/sub/b.html">B</a> <a href="c.html">C</a>"#.to_string()),
        1,
    )
    .await;

    mount(
        site,
        "/sub/b.html",
        html(r#"<a href="../d.html">D</a> <img src="small_image.gif">"#.to_string()),
        1,
    )
    .await;

    // Fetched directly and again as the target of /old
    mount(site, "/c.html", html("<p>C</p>".to_string()), 2).await;

    mount(site, "/d.html", html(r#"<a href="/old">Old</a>"#.to_string()), 1).await;

    mount(
        site,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/c.html"),
        1,
    )
    .await;

    mount(
        site,
        "/css/style.css",
        ResponseTemplate::new(200).set_body_raw("body { color: black; }", "text/css"),
        1,
    )
    .await;

    mount(
        site,
        "/js/app.js",
        ResponseTemplate::new(200).set_body_raw("console.log('hi');", "application/javascript"),
        1,
    )
    .await;

    mount(
        site,
        "/sub/small_image.gif",
        ResponseTemplate::new(200)
            .set_body_bytes(b"GIF89a".to_vec())
            .insert_header("content-type", "image/gif"),
        1,
    )
    .await;

    mount(site, "/missing.html", ResponseTemplate::new(404), 1).await;

    mount(
        external,
        "/external.html",
        html(r#"<a href="/never.html">Never</a>"#.to_string()),
        1,
    )
    .await;

    // Out of scope pages are checked, never expanded
    mount(external, "/never.html", html(String::new()), 0).await;
}

async fn crawl_fixture_site(mode: ConcurrencyMode, workers: usize) {
    let site_server = MockServer::start().await;
    let external_server = MockServer::start().await;
    mount_fixture_site(&site_server, &external_server).await;

    let seed = format!("{}/index.html", site_server.uri());
    let crawler = SiteCrawler::new(
        ScopeConfig::new([seed.clone()], Vec::<String>::new()),
        WorkerConfig {
            timeout: Duration::from_secs(5),
            ..WorkerConfig::default()
        },
        workers,
        mode.backend(),
        test_fetcher(),
    );

    let site = crawler.crawl().await.expect("Crawl failed");

    assert_eq!(site.len(), 11, "Expected exactly 11 pages");
    assert_eq!(site.error_count(), 1, "Expected exactly 1 error page");

    let missing = normalize(&format!("{}/missing.html", site_server.uri())).unwrap();
    let broken = site.error_pages().next().unwrap();
    assert_eq!(broken.url, missing);
    assert_eq!(broken.status, Some(404));
    assert_eq!(broken.failure, Some(FetchFailure::Http { status: 404 }));

    let index = site.page(&normalize(&seed).unwrap()).unwrap();
    assert!(index.is_local);
    assert!(index.is_html);
    let count = |t: LinkType| index.links.iter().filter(|l| l.link_type == t).count();
    assert_eq!(count(LinkType::Anchor), 5);
    assert_eq!(count(LinkType::Image), 1);
    assert_eq!(count(LinkType::Script), 1);
    assert_eq!(count(LinkType::Stylesheet), 1);

    let old = site
        .page(&normalize(&format!("{}/old", site_server.uri())).unwrap())
        .unwrap();
    assert!(old.is_redirect);
    assert_eq!(old.status, Some(200));
    assert!(!old.is_error());

    let external = format!("http://localhost:{}/external.html", external_server.address().port());
    let external = site.page(&normalize(&external).unwrap()).unwrap();
    assert!(!external.is_local);
    assert!(external.links.is_empty());

    let image = site
        .page(&normalize(&format!("{}/sub/small_image.gif", site_server.uri())).unwrap())
        .unwrap();
    assert!(!image.is_html);
    assert!(image.links.is_empty());

    // Wiremock verifies the expected request counts when the servers drop
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fixture_site_thread_backend() {
    crawl_fixture_site(ConcurrencyMode::Thread, 4).await;
}

#[tokio::test]
async fn test_fixture_site_task_backend() {
    crawl_fixture_site(ConcurrencyMode::Task, 4).await;
}

#[tokio::test]
async fn test_fixture_site_single_worker() {
    crawl_fixture_site(ConcurrencyMode::Task, 1).await;
}

#[tokio::test]
async fn test_accepted_host_is_expanded() {
    let site_server = MockServer::start().await;
    let docs_server = MockServer::start().await;
    let docs = format!("http://localhost:{}", docs_server.address().port());

    mount(
        &site_server,
        "/",
        html(format!(r#"<a href="{}/guide.html">Guide</a>"#, docs)),
        1,
    )
    .await;
    mount(
        &docs_server,
        "/guide.html",
        html(r#"<a href="/gone.html">Gone</a>"#.to_string()),
        1,
    )
    .await;
    mount(&docs_server, "/gone.html", ResponseTemplate::new(410), 1).await;

    let crawler = SiteCrawler::new(
        ScopeConfig::new([site_server.uri()], ["localhost"]),
        WorkerConfig::default(),
        2,
        ConcurrencyMode::Task.backend(),
        test_fetcher(),
    );

    let site = crawler.crawl().await.expect("Crawl failed");

    assert_eq!(site.len(), 3);
    let gone = site
        .page(&normalize(&format!("{}/gone.html", docs)).unwrap())
        .unwrap();
    assert_eq!(gone.status, Some(410));
    assert!(gone.is_local);
    assert_eq!(site.referrers(&gone.url).len(), 1);
}

#[tokio::test]
async fn test_slow_page_is_timeout_error() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/",
        html(r#"<a href="/slow.html">Slow</a> <a href="/fast.html">Fast</a>"#.to_string()),
        1,
    )
    .await;
    mount(
        &server,
        "/slow.html",
        html("<p>late</p>".to_string()).set_delay(Duration::from_secs(3)),
        1,
    )
    .await;
    mount(&server, "/fast.html", html("<p>ok</p>".to_string()), 1).await;

    let crawler = SiteCrawler::new(
        ScopeConfig::new([server.uri()], Vec::<String>::new()),
        WorkerConfig {
            timeout: Duration::from_millis(300),
            ..WorkerConfig::default()
        },
        2,
        ConcurrencyMode::Task.backend(),
        test_fetcher(),
    );

    let site = crawler.crawl().await.expect("Crawl failed");

    assert_eq!(site.len(), 3);
    assert_eq!(site.error_count(), 1);
    let slow = site.error_pages().next().unwrap();
    assert!(slow.url.as_str().ends_with("/slow.html"));
    assert!(slow.is_timeout);
    assert_eq!(slow.status, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_credentials_sent_with_every_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(html(r#"<a href="/private.html">Private</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private.html"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(html("<p>secret</p>".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = SiteCrawler::new(
        ScopeConfig::new([server.uri()], Vec::<String>::new()),
        WorkerConfig {
            credentials: Some(Credentials {
                username: "user".to_string(),
                password: Some("pass".to_string()),
            }),
            ..WorkerConfig::default()
        },
        2,
        ConcurrencyMode::Thread.backend(),
        test_fetcher(),
    );

    let site = crawler.crawl().await.expect("Crawl failed");

    assert_eq!(site.len(), 2);
    assert_eq!(site.error_count(), 0);
}
