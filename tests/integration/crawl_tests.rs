//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the real
//! reqwest fetcher and HTML extractor through the scheduler end-to-end.

use ripple_frontier::config::{
    Config, FilterConfig, FrontierConfig, SchedulerConfig, UserAgentConfig,
};
use ripple_frontier::crawler::{Coordinator, SessionAuth};
use ripple_frontier::UrlStatus;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling from `seeds`
fn create_test_config(seeds: Vec<String>, max_depth: i32, max_retries: u32) -> Config {
    Config {
        frontier: FrontierConfig {
            max_depth,
            max_retries,
            min_domain_spacing: 10, // Very short for testing
            stale_processing_timeout: 300,
        },
        scheduler: SchedulerConfig {
            max_workers: 4,
            batch_size: 8,
            follow_external_links: false,
            fetch_timeout: 5,
            shutdown_grace_period: 1,
            idle_poll_interval: 20,
        },
        filters: FilterConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        seeds,
        ..Config::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/page2#top">Page 2 again</a>
            <a href="https://elsewhere.example/">External</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><body><a href="/page3">Too deep</a></body></html>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<html><body>Content 2</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], 1, 3);
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    assert_eq!(coordinator.seed(&[]), 1);

    let summary = coordinator.run(CancellationToken::new()).await;

    assert!(summary.is_complete());
    assert_eq!(summary.status.completed, 3);
    assert_eq!(summary.status.failed, 0);
    assert_eq!(summary.status.total_urls, 3);
    assert_eq!(summary.status.discovered, 2);
    assert_eq!(summary.dispatch.dispatched, 3);
    assert_eq!(summary.dispatch.successes, 3);
    assert!(coordinator
        .frontier()
        .record(&format!("{}/page3", base_url))
        .is_none());

    let page1 = coordinator
        .frontier()
        .record(&format!("{}/page1", base_url))
        .unwrap();
    assert_eq!(page1.depth, 1);
    assert_eq!(page1.status, UrlStatus::Completed);
}

#[tokio::test]
async fn test_not_found_retried_until_failed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/missing", base_url)], 0, 3);
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.seed(&[]);

    let summary = coordinator.run(CancellationToken::new()).await;

    assert_eq!(summary.status.failed, 1);
    assert_eq!(summary.dispatch.failures, 3);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].retry_count, 3);
    assert_eq!(summary.failed[0].last_error.as_deref(), Some("HTTP 404"));
    assert!(summary.failed[0].last_attempt.is_some());
}

#[tokio::test]
async fn test_repeated_terminal_failures_back_off_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let seeds = (1..=3).map(|i| format!("{}/broken{}", base_url, i)).collect();
    let config = create_test_config(seeds, 0, 1);
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.seed(&[]);

    let summary = coordinator.run(CancellationToken::new()).await;

    assert_eq!(summary.status.failed, 3);
    let backed_off = summary.domains_in_backoff();
    assert_eq!(backed_off.len(), 1);

    let domain = &summary.domains[backed_off[0]];
    assert_eq!(domain.consecutive_failures, 3);
    assert_eq!(domain.request_count, 3);
    assert!(domain.backoff_remaining.unwrap() > Duration::from_secs(100));
}

#[tokio::test]
async fn test_session_credentials_sent() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("authorization", "Bearer s3cret"))
        .and(header("x-tenant", "acme"))
        .and(header("cookie", "sid=abc"))
        .respond_with(html("<html><body>Welcome</body></html>".to_string()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/private", base_url)], 0, 1);
    let coordinator = Coordinator::new(config).unwrap().with_session("crawler");

    let mut headers = BTreeMap::new();
    headers.insert("X-Tenant".to_string(), "acme".to_string());
    let mut cookies = BTreeMap::new();
    cookies.insert("sid".to_string(), "abc".to_string());
    coordinator.sessions().create_session(
        "crawler",
        SessionAuth {
            cookies,
            headers,
            auth_token: Some("s3cret".to_string()),
        },
    );
    coordinator.seed(&[]);

    let summary = coordinator.run(CancellationToken::new()).await;

    assert_eq!(summary.status.completed, 1);
    assert_eq!(summary.dispatch.active_sessions, 1);
}

#[tokio::test]
async fn test_cancellation_returns_in_flight_to_pending() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<html></html>".to_string()).set_delay(Duration::from_secs(4)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/slow", base_url)], 0, 3);
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.seed(&[]);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });
    }

    let summary = coordinator.run(cancel).await;

    assert!(!summary.is_complete());
    assert_eq!(summary.dispatch.dispatched, 1);
    assert_eq!(summary.status.processing, 0);
    assert_eq!(summary.status.pending, 1);

    let record = coordinator
        .frontier()
        .record(&format!("{}/slow", base_url))
        .unwrap();
    assert_eq!(record.retry_count, 0);
}
