//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! crawl cycle end-to-end through the real HTTP fetcher.

use crawly::config::Config;
use crawly::crawler::{build_http_client, crawl, Coordinator, FetchResult, Fetcher, HttpFetcher};
use crawly::output::build_tree;
use crawly::CrawlyError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config(workers: usize) -> Config {
    let mut config = Config::default();
    config.crawler.max_workers = workers;
    config.crawler.request_timeout = 5;
    config.crawler.connect_timeout = 2;
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="{base}/page1">Page 1</a>
               <a href="/page2">Page 2</a>
               <a href="/report.pdf">Report</a>
               <a href="http://external.test/page">External</a>"#
        ),
    )
    .await;
    mount_page(&mock_server, "/page1", r#"<a href="/page1/deep">Deep</a>"#).await;
    mount_page(&mock_server, "/page2", r#"<a href="/">Home</a>"#).await;
    mount_page(&mock_server, "/page1/deep", "<p>bottom</p>").await;

    // Ignored extensions are never requested
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", base);
    let report = crawl(&seed, &create_test_config(1))
        .await
        .expect("Crawl failed");

    assert_eq!(report.seed, seed);
    assert_eq!(report.crawled_pages.len(), 4);
    assert!(report.crawled_pages.contains(&format!("{}/page1/deep", base)));
    assert!(!report.crawled_pages.contains(&format!("{}/report.pdf", base)));

    let root_children = report.sitemap.children(&seed).expect("seed has children");
    assert!(root_children.contains(&format!("{}/page1", base)));
    assert!(root_children.contains(&format!("{}/page2", base)));
    assert!(root_children.contains(&format!("{}/report.pdf", base)));
    assert!(!root_children.iter().any(|c| c.contains("external.test")));

    let tree = build_tree(&report.seed, &report.sitemap).expect("Tree build failed");
    assert_eq!(tree.len(), 5);
    let page1 = tree
        .root()
        .find(&format!("{}/page1", base))
        .expect("page1 in tree");
    let deep: Vec<&str> = page1.children().map(|node| node.url()).collect();
    assert_eq!(deep, vec![format!("{}/page1/deep", base)]);
}

#[tokio::test]
async fn test_redirect_substitutes_final_url() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/x">Old</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/y"))
        .mount(&mock_server)
        .await;

    mount_page(&mock_server, "/y", r#"<a href="/z">Z</a>"#).await;
    mount_page(&mock_server, "/z", "").await;

    let seed = format!("{}/", base);
    let report = crawl(&seed, &create_test_config(1))
        .await
        .expect("Crawl failed");

    let y = format!("{}/y", base);
    assert_eq!(report.sitemap.children(&seed), Some(&[y.clone()][..]));
    assert!(report.crawled_pages.contains(&y));
    assert!(!report.crawled_pages.contains(&format!("{}/x", base)));
    assert_eq!(
        report.sitemap.children(&y),
        Some(&[format!("{}/z", base)][..])
    );
}

#[tokio::test]
async fn test_redirect_onto_linked_page_keeps_one_parent() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/old">Old</a><a href="/section">Section</a>"#,
    )
    .await;
    mount_page(&mock_server, "/section", r#"<a href="/new">New</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page(""))
        .mount(&mock_server)
        .await;

    let seed = format!("{}/", base);
    let report = crawl(&seed, &create_test_config(1))
        .await
        .expect("Crawl failed");

    // Whichever job reached /new first owns it; the tree must still build
    let tree = build_tree(&report.seed, &report.sitemap).expect("one parent per URL");
    assert!(tree.contains(&format!("{}/new", base)));
    assert!(!tree.contains(&format!("{}/old", base)));
}

#[tokio::test]
async fn test_error_pages_are_dropped() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/broken">Broken</a><a href="/missing">Missing</a><a href="/ok">Ok</a>"#,
    )
    .await;
    mount_page(&mock_server, "/ok", "").await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"<a href="/hidden">x</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Unmatched paths answer 404
    let seed = format!("{}/", base);
    let report = crawl(&seed, &create_test_config(2))
        .await
        .expect("Crawl failed");

    assert_eq!(report.crawled_pages.len(), 2);
    assert_eq!(
        report.sitemap.children(&seed),
        Some(&[format!("{}/ok", base)][..])
    );
    assert_eq!(report.statistics.http_errors, 2);
    assert_eq!(report.statistics.transport_errors, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_multi_worker_crawl_requests_each_page_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    // Every page links to every other page
    let routes: Vec<String> = (0..20).map(|i| format!("/p{}", i)).collect();
    let links: String = routes
        .iter()
        .map(|r| format!(r#"<a href="{}">{}</a>"#, r, r))
        .collect();

    mount_page(&mock_server, "/", &links).await;
    for route in &routes {
        mount_page(&mock_server, route, &links).await;
    }

    let seed = format!("{}/", base);
    let report = crawl(&seed, &create_test_config(8))
        .await
        .expect("Crawl failed");

    assert_eq!(report.crawled_pages.len(), 21);
    assert_eq!(report.statistics.links_found, 21);
    assert_eq!(report.sitemap.link_count(), 20);

    let tree = build_tree(&report.seed, &report.sitemap).expect("Tree build failed");
    assert_eq!(tree.len(), 21);

    // The .expect(1) on every mock is verified when the server drops
}

#[tokio::test]
async fn test_query_strip_collapses_pages() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/list?page=1">1</a><a href="/list?page=2">2</a>"#,
    )
    .await;
    mount_page(&mock_server, "/list", "").await;

    let mut config = create_test_config(1);
    config.crawler.query_policy = crawly::QueryPolicy::Strip;

    let seed = format!("{}/", base);
    let report = crawl(&seed, &config).await.expect("Crawl failed");

    assert_eq!(
        report.sitemap.children(&seed),
        Some(&[format!("{}/list", base)][..])
    );
}

#[tokio::test]
async fn test_fetcher_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "Mozilla/5.0 Crawly"))
        .respond_with(html_page("hello"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&Config::default()).expect("client");
    let url = format!("{}/", mock_server.uri());

    match fetcher.fetch(&url).await {
        FetchResult::Success {
            final_url,
            status_code,
            redirected,
            body,
        } => {
            assert_eq!(final_url, url);
            assert_eq!(status_code, 200);
            assert!(!redirected);
            assert!(body.contains("hello"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetcher_reports_redirect_and_status() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/from"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/to"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/to"))
        .respond_with(html_page(""))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&Config::default()).expect("client");
    let fetcher = HttpFetcher::with_client(client);

    match fetcher.fetch(&format!("{}/from", base)).await {
        FetchResult::Success {
            final_url,
            redirected,
            ..
        } => {
            assert_eq!(final_url, format!("{}/to", base));
            assert!(redirected);
        }
        other => panic!("expected success, got {:?}", other),
    }

    assert_eq!(
        fetcher.fetch(&format!("{}/gone", base)).await,
        FetchResult::HttpError { status_code: 410 }
    );
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let result = crawl("ftp://files.test/", &Config::default()).await;
    assert!(matches!(result, Err(CrawlyError::Url(_))));
}

#[tokio::test]
async fn test_coordinator_with_progress() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", r#"<a href="/a">A</a>"#).await;
    mount_page(&mock_server, "/a", "").await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let seed = url::Url::parse(&format!("{}/", mock_server.uri())).expect("seed");
    let report = Coordinator::new(seed, &create_test_config(2))
        .expect("coordinator")
        .with_progress(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .run()
        .await
        .expect("Crawl failed");

    assert_eq!(report.crawled_pages.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
