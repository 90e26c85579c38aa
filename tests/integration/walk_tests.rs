//! Integration tests for the sitemap walker
//!
//! These tests use wiremock to create mock HTTP servers and drive complete
//! walks end-to-end: discovery, index traversal, policy, limits and retries.

use flate2::write::GzEncoder;
use flate2::Compression;
use reqwest::StatusCode;
use sitemap_walker::diagnostics::CollectingSink;
use sitemap_walker::{Diagnostic, DiagnosticSink, Item, Options, SitemapFetcher, WalkError};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AGENT: &str = "TestBot/1.0";

/// Builds a fetcher with a test user agent and a collecting diagnostics sink
fn create_fetcher(configure: impl FnOnce(&mut Options)) -> (SitemapFetcher, Arc<CollectingSink>) {
    let sink = CollectingSink::new();
    let mut options = Options {
        user_agent: Some(AGENT.to_string()),
        diagnostics: Some(sink.clone() as Arc<dyn DiagnosticSink>),
        ..Options::default()
    };
    configure(&mut options);
    let fetcher = SitemapFetcher::new(options).expect("Failed to build fetcher");
    (fetcher, sink)
}

/// Runs a walk and collects every delivered item alongside the outcome
async fn collect(fetcher: &SitemapFetcher, website: &str) -> (Vec<Item>, Result<(), WalkError>) {
    let mut items = Vec::new();
    let result = fetcher
        .walk(&CancellationToken::new(), website, |item| {
            items.push(item);
            Ok::<(), std::io::Error>(())
        })
        .await;
    (items, result)
}

fn locations(items: &[Item]) -> Vec<String> {
    items.iter().map(|item| item.location().to_string()).collect()
}

fn urlset(locs: &[&str]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <url><loc>{}</loc></url>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
        entries
    )
}

fn sitemap_index(locs: &[&str]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("  <sitemap><loc>{}</loc></sitemap>\n", loc))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</sitemapindex>",
        entries
    )
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

async fn mount_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_urlset_yields_every_entry() {
    let server = MockServer::start().await;
    let base = server.uri();
    let body = format!(
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>{base}/first</loc>
    <lastmod>2024-05-06T07:08:09+02:00</lastmod>
    <changefreq> weekly </changefreq>
    <priority>0.9</priority>
  </url>
  <url><loc>{base}/second</loc></url>
  <url><loc>{base}/third</loc><lastmod>2024-01-01</lastmod></url>
</urlset>"#
    );
    mount_xml(&server, "/sitemap.xml", body).await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(
        locations(&items),
        vec![
            format!("{}/first", base),
            format!("{}/second", base),
            format!("{}/third", base),
        ]
    );

    let first = &items[0];
    assert_eq!(first.change_frequency(), "weekly");
    assert_eq!(first.priority(), Some(0.9));
    assert_eq!(
        first.last_modified().map(|t| t.to_rfc3339()),
        Some("2024-05-06T07:08:09+02:00".to_string())
    );
    assert_eq!(first.source_sitemap().as_str(), format!("{}/sitemap.xml", base));

    assert_eq!(items[1].change_frequency(), "");
    assert_eq!(items[1].priority(), None);
    assert!(items[1].last_modified().is_none());
    assert!(items[2].last_modified().is_some());
}

#[tokio::test]
async fn test_relative_locations_resolve_against_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(
        &server,
        "/blog/sitemap.xml",
        urlset(&["post-1", "/about", "  ../contact  ", "post-2#comments"]),
    )
    .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/blog/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(
        locations(&items),
        vec![
            format!("{}/blog/post-1", base),
            format!("{}/about", base),
            format!("{}/contact", base),
            format!("{}/blog/post-2", base),
        ]
    );
}

#[tokio::test]
async fn test_index_items_carry_nested_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(
        &server,
        "/sitemap_index.xml",
        sitemap_index(&["/posts.xml", &format!("{}/pages.xml", base)]),
    )
    .await;
    mount_xml(&server, "/posts.xml", urlset(&["/p1", "/p2"])).await;
    mount_xml(&server, "/pages.xml", urlset(&["/about"])).await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap_index.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(
        locations(&items),
        vec![
            format!("{}/p1", base),
            format!("{}/p2", base),
            format!("{}/about", base),
        ]
    );
    assert_eq!(items[0].source_sitemap().path(), "/posts.xml");
    assert_eq!(items[1].source_sitemap().path(), "/posts.xml");
    assert_eq!(items[2].source_sitemap().path(), "/pages.xml");
}

#[tokio::test]
async fn test_gzip_sitemap_matches_plain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let body = urlset(&["/a", "/b", "/c"]);
    mount_xml(&server, "/plain.xml", body.clone()).await;
    Mock::given(method("GET"))
        .and(path("/compressed.xml.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-gzip")
                .set_body_bytes(gzip(body.as_bytes())),
        )
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (plain, plain_result) = collect(&fetcher, &format!("{}/plain.xml", base)).await;
    let (compressed, gz_result) =
        collect(&fetcher, &format!("{}/compressed.xml.gz", base)).await;

    plain_result.expect("Plain walk should succeed");
    gz_result.expect("Gzip walk should succeed");
    assert_eq!(plain.len(), 3);
    assert_eq!(locations(&plain), locations(&compressed));
}

#[tokio::test]
async fn test_robots_disallowed_sitemap_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_robots(&server, "User-agent: *\nDisallow: /sitemap.xml").await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/a"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Disallowed sitemap is a silent skip");
    assert!(items.is_empty());
    assert!(sink
        .events()
        .iter()
        .any(|event| matches!(event, Diagnostic::SitemapDisallowed { .. })));
}

#[tokio::test]
async fn test_ignore_robots_fetches_disallowed_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;
    mount_xml(&server, "/sitemap.xml", urlset(&["/a", "/b"])).await;

    let (fetcher, _) = create_fetcher(|options| options.ignore_robots = true);
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_robots_disallowed_urls_are_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_xml(
        &server,
        "/sitemap.xml",
        urlset(&["/public", "/private/report", "/also-public"]),
    )
    .await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(
        locations(&items),
        vec![format!("{}/public", base), format!("{}/also-public", base)]
    );
    assert!(sink.events().contains(&Diagnostic::UrlDisallowed {
        url: url::Url::parse(&format!("{}/private/report", base)).unwrap(),
    }));
}

#[tokio::test]
async fn test_robots_declared_sitemaps_seed_the_walk() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_robots(
        &server,
        &format!(
            "User-agent: *\nAllow: /\nSitemap: {}/custom.xml\nSitemap: /relative.xml\n",
            base
        ),
    )
    .await;
    mount_xml(&server, "/custom.xml", urlset(&["/from-custom"])).await;
    mount_xml(&server, "/relative.xml", urlset(&["/from-relative"])).await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/default"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &base).await;

    result.expect("Walk should succeed");
    assert_eq!(
        locations(&items),
        vec![
            format!("{}/from-custom", base),
            format!("{}/from-relative", base),
        ]
    );
}

#[tokio::test]
async fn test_default_locations_are_probed() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap_index.xml", sitemap_index(&["/posts.xml"])).await;
    mount_xml(&server, "/posts.xml", urlset(&["/post"])).await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &base).await;

    result.expect("Probe misses are not fatal");
    assert_eq!(locations(&items), vec![format!("{}/post", base)]);

    let misses: Vec<String> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Diagnostic::ProbeMissing { url } => Some(url.path().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        misses,
        vec![
            "/sitemap.xml",
            "/sitemap-index.xml",
            "/sitemap.xml.gz",
            "/sitemap_index.xml.gz",
            "/sitemap-index.xml.gz",
        ]
    );
}

#[tokio::test]
async fn test_explicit_missing_sitemap_is_fatal() {
    let server = MockServer::start().await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/missing.xml", server.uri())).await;

    assert!(items.is_empty());
    let err = result.expect_err("404 on an explicit sitemap must fail");
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn test_missing_declared_sitemap_is_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_robots(&server, "User-agent: *\nAllow: /\nSitemap: /gone.xml\n").await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/fallback"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &base).await;

    assert!(items.is_empty());
    match result {
        Err(WalkError::UnexpectedStatus { status, url }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(url.path(), "/gone.xml");
        }
        other => panic!("Expected UnexpectedStatus, got {:?}", other),
    }
    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, Diagnostic::ProbeMissing { .. })));
}

#[tokio::test]
async fn test_include_and_exclude_filters() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&["/keep", "/keep/skip", "/other"])).await;

    let (fetcher, _) = create_fetcher(|options| {
        options.include = vec!["keep".to_string()];
        options.exclude = vec!["skip".to_string()];
    });
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(locations(&items), vec![format!("{}/keep", base)]);
}

#[tokio::test]
async fn test_max_urls_stops_at_boundary() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&["/one", "/two"])).await;

    let (fetcher, _) = create_fetcher(|options| options.max_urls = 1);
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    assert_eq!(locations(&items), vec![format!("{}/one", base)]);
    let err = result.expect_err("Second URL must exceed the limit");
    assert!(matches!(err, WalkError::MaxUrlsExceeded { limit: 1 }));
    assert!(err.is_limit());
}

#[tokio::test]
async fn test_max_urls_equal_to_count_succeeds() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&["/one", "/two"])).await;

    let (fetcher, _) = create_fetcher(|options| options.max_urls = 2);
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Exactly max_urls items is within the limit");
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_max_depth_exceeded() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/index.xml", sitemap_index(&["/nested.xml"])).await;
    mount_xml(&server, "/nested.xml", sitemap_index(&["/leaf.xml"])).await;
    Mock::given(method("GET"))
        .and(path("/leaf.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/deep"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|options| options.max_depth = 1);
    let (items, result) = collect(&fetcher, &format!("{}/index.xml", base)).await;

    assert!(items.is_empty());
    match result {
        Err(WalkError::MaxDepthExceeded { limit, url }) => {
            assert_eq!(limit, 1);
            assert_eq!(url.path(), "/leaf.xml");
        }
        other => panic!("Expected MaxDepthExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_max_sitemaps_exceeded() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/index.xml", sitemap_index(&["/a.xml", "/b.xml"])).await;
    mount_xml(&server, "/a.xml", urlset(&["/from-a"])).await;
    Mock::given(method("GET"))
        .and(path("/b.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/from-b"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|options| options.max_sitemaps = 2);
    let (items, result) = collect(&fetcher, &format!("{}/index.xml", base)).await;

    assert_eq!(locations(&items), vec![format!("{}/from-a", base)]);
    assert!(matches!(
        result,
        Err(WalkError::MaxSitemapsExceeded { limit: 2 })
    ));
}

#[tokio::test]
async fn test_cycles_fetch_each_sitemap_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    for (at, body) in [
        ("/a.xml", sitemap_index(&["/b.xml", "/a.xml#again"])),
        ("/b.xml", sitemap_index(&["/a.xml", "/c.xml", "/b.xml"])),
        ("/c.xml", urlset(&["/page"])),
    ] {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/a.xml", base)).await;

    result.expect("Cycles must terminate");
    assert_eq!(locations(&items), vec![format!("{}/page", base)]);
}

#[tokio::test]
async fn test_callback_failure_stops_walk() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&["/one", "/two", "/three"])).await;

    let (fetcher, _) = create_fetcher(|_| {});
    let mut seen = 0;
    let result = fetcher
        .walk(
            &CancellationToken::new(),
            &format!("{}/sitemap.xml", base),
            |_item| {
                seen += 1;
                if seen == 2 {
                    return Err("consumer is full");
                }
                Ok(())
            },
        )
        .await;

    assert_eq!(seen, 2);
    match result {
        Err(WalkError::Callback { source }) => assert_eq!(source.to_string(), "consumer is full"),
        other => panic!("Expected Callback error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_from_callback() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/index.xml", sitemap_index(&["/a.xml", "/b.xml"])).await;
    mount_xml(&server, "/a.xml", urlset(&["/a1", "/a2"])).await;
    Mock::given(method("GET"))
        .and(path("/b.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/b1"])))
        .expect(0)
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let cancel = CancellationToken::new();
    let mut items = Vec::new();
    let result = fetcher
        .walk(&cancel, &format!("{}/index.xml", base), |item| {
            items.push(item);
            cancel.cancel();
            Ok::<(), std::io::Error>(())
        })
        .await;

    assert_eq!(items.len(), 1);
    let err = result.expect_err("Cancelled walk must fail");
    assert!(matches!(err, WalkError::Cancelled));
    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_per_request_timeout() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(urlset(&["/slow"]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (fetcher, _) =
        create_fetcher(|options| options.per_request_timeout = Duration::from_millis(200));
    let started = Instant::now();
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    assert!(items.is_empty());
    let err = result.expect_err("Slow server must time out");
    assert!(err.is_cancellation(), "unexpected error: {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_retry_after_then_success() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_xml(&server, "/sitemap.xml", urlset(&["/a", "/b"])).await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let started = Instant::now();
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed after one retry");
    assert_eq!(items.len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(sink.events().iter().any(|event| matches!(
        event,
        Diagnostic::RateLimited { attempt: 1, delay, .. } if *delay == Duration::from_secs(1)
    )));
}

#[tokio::test]
async fn test_allow_non_success_skips_broken_children() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/index.xml", sitemap_index(&["/broken.xml", "/ok.xml"])).await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_xml(&server, "/ok.xml", urlset(&["/fine"])).await;

    let (lenient, sink) = create_fetcher(|options| options.allow_non_success = true);
    let (items, result) = collect(&lenient, &format!("{}/index.xml", base)).await;
    result.expect("Non-success children are skipped");
    assert_eq!(locations(&items), vec![format!("{}/fine", base)]);
    assert!(sink.events().iter().any(|event| matches!(
        event,
        Diagnostic::NonSuccessSkipped { status, .. } if *status == StatusCode::INTERNAL_SERVER_ERROR
    )));

    let (strict, _) = create_fetcher(|_| {});
    let (items, result) = collect(&strict, &format!("{}/index.xml", base)).await;
    assert!(items.is_empty());
    assert_eq!(
        result.expect_err("500 must fail").status(),
        Some(StatusCode::INTERNAL_SERVER_ERROR)
    );
}

#[tokio::test]
async fn test_malformed_document_is_parse_error() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(
        &server,
        "/sitemap.xml",
        "<urlset><url><loc>/ok</loc></url><url><loc>/cut".to_string(),
    )
    .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    assert_eq!(locations(&items), vec![format!("{}/ok", base)]);
    match result {
        Err(WalkError::SitemapParse { url, .. }) => assert_eq!(url.path(), "/sitemap.xml"),
        other => panic!("Expected SitemapParse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_entries_are_diagnostics() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(
        &server,
        "/sitemap.xml",
        r#"<urlset>
  <url><loc>   </loc></url>
  <url><loc>/good</loc><lastmod>last tuesday</lastmod><priority>high</priority></url>
</urlset>"#
            .to_string(),
    )
    .await;

    let (fetcher, sink) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Malformed entries are not fatal");
    assert_eq!(locations(&items), vec![format!("{}/good", base)]);
    assert!(items[0].last_modified().is_none());
    assert!(items[0].priority().is_none());

    let events = sink.events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Diagnostic::InvalidUrlLocation { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Diagnostic::InvalidLastModified { value, .. } if value == "last tuesday")));
    assert!(events
        .iter()
        .any(|e| matches!(e, Diagnostic::InvalidPriority { value, .. } if value == "high")));
}

#[tokio::test]
async fn test_user_agent_sent_everywhere() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header("user-agent", AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["/a"])))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (items, result) = collect(&fetcher, &format!("{}/sitemap.xml", base)).await;

    result.expect("Walk should succeed");
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_rewalk_is_deterministic() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/index.xml", sitemap_index(&["/x.xml", "/y.xml"])).await;
    mount_xml(&server, "/x.xml", urlset(&["/x1", "/x2"])).await;
    mount_xml(&server, "/y.xml", urlset(&["/y1"])).await;

    let (fetcher, _) = create_fetcher(|_| {});
    let (first, first_result) = collect(&fetcher, &format!("{}/index.xml", base)).await;
    let (second, second_result) = collect(&fetcher, &format!("{}/index.xml", base)).await;

    first_result.expect("First walk should succeed");
    second_result.expect("Second walk should succeed");
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_walks_share_fetcher() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_xml(&server, "/sitemap.xml", urlset(&["/a", "/b"])).await;

    let (fetcher, _) = create_fetcher(|_| {});
    let website = format!("{}/sitemap.xml", base);
    let (left, right) = tokio::join!(collect(&fetcher, &website), collect(&fetcher, &website));

    left.1.expect("Left walk should succeed");
    right.1.expect("Right walk should succeed");
    assert_eq!(locations(&left.0), locations(&right.0));
}

#[tokio::test]
#[ignore = "streams a 50k-entry document"]
async fn test_large_sitemap_streams() {
    const ENTRIES: usize = 50_000;

    let server = MockServer::start().await;
    let base = server.uri();
    let locs: Vec<String> = (0..ENTRIES).map(|i| format!("/page/{}", i)).collect();
    let loc_refs: Vec<&str> = locs.iter().map(String::as_str).collect();
    let body = urlset(&loc_refs);
    Mock::given(method("GET"))
        .and(path("/large.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(body.as_bytes())))
        .mount(&server)
        .await;

    let (fetcher, _) = create_fetcher(|_| {});
    let mut count = 0usize;
    let mut last = None;
    let result = fetcher
        .walk(
            &CancellationToken::new(),
            &format!("{}/large.xml.gz", base),
            |item| {
                count += 1;
                last = Some(item.location().path().to_string());
                Ok::<(), std::io::Error>(())
            },
        )
        .await;

    result.expect("Large walk should succeed");
    assert_eq!(count, ENTRIES);
    assert_eq!(last.as_deref(), Some("/page/49999"));
}
