//! Behavioural properties of the frontier, driven through the public API
//!
//! Time-dependent properties run on a paused tokio clock so spacing and
//! backoff windows can be crossed with `tokio::time::advance`.

use ripple_frontier::config::{validate, Config, FilterConfig, FrontierConfig};
use ripple_frontier::crawler::DiscoveryFeedback;
use ripple_frontier::{normalize_url, Frontier, Priority, UrlFilter, UrlStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn frontier_with(max_depth: i32, max_retries: u32, spacing_ms: u64) -> Frontier {
    let config = FrontierConfig {
        max_depth,
        max_retries,
        min_domain_spacing: spacing_ms,
        stale_processing_timeout: 300,
    };
    let filter = UrlFilter::new(&FilterConfig::default()).expect("default filter compiles");
    Frontier::new(config, filter).expect("valid frontier config")
}

#[test]
fn test_normalization_is_idempotent() {
    let inputs = [
        "HTTPS://Example.COM/Path/?b=2&a=1&utm_source=x#frag",
        "example.com",
        "http://example.com:8080//docs//",
        "https://example.com/search?q=rust+lang&empty=&fbclid=abc",
        "https://example.com/a%20b?x=%2F",
        "https://sub.example.co.uk/index.html?z=1&z=0",
    ];

    for input in inputs {
        let once = normalize_url(input).expect("normalizes");
        let twice = normalize_url(once.as_str()).expect("normalizes again");
        assert_eq!(once, twice, "not idempotent for {}", input);
    }
}

#[test]
fn test_equivalent_forms_dedup() {
    let frontier = frontier_with(3, 3, 0);

    let first = frontier.admit(["https://a.com/x?b=2&a=1"], Priority::Medium, 0, None);
    let second = frontier.admit(["https://a.com/x?a=1&b=2"], Priority::Medium, 0, None);
    assert_eq!(first + second, 1);

    let more = frontier.admit(
        [
            "https://A.COM/x/?a=1&b=2",
            "https://a.com/x?a=1&b=2#section",
            "https://a.com/x?utm_campaign=spring&b=2&a=1",
        ],
        Priority::High,
        0,
        None,
    );
    assert_eq!(more, 0);
    assert_eq!(frontier.status().total_urls, 1);
}

#[test]
fn test_terminal_urls_are_never_readmitted() {
    let frontier = frontier_with(3, 1, 0);
    frontier.admit(["https://a.com/gone"], Priority::Medium, 0, None);

    let batch = frontier.next_batch(1);
    frontier.report(&batch[0], false, Some("HTTP 410"), Duration::ZERO);
    assert_eq!(frontier.status().failed, 1);

    assert_eq!(
        frontier.admit(["https://a.com/gone"], Priority::High, 0, None),
        0
    );
    assert_eq!(frontier.status().pending, 0);
}

#[test]
fn test_depth_bound() {
    let frontier = frontier_with(2, 3, 0);

    assert_eq!(
        frontier.admit(["https://a.com/deep"], Priority::High, 3, None),
        0
    );
    assert_eq!(
        frontier.admit(["https://a.com/edge"], Priority::High, 2, None),
        1
    );
    assert_eq!(frontier.status().total_urls, 1);
}

#[test]
fn test_priority_ordering() {
    let frontier = frontier_with(3, 3, 0);
    frontier.admit(["https://high.com/"], Priority::High, 0, None);
    frontier.admit(["https://medium.com/"], Priority::Medium, 0, None);
    frontier.admit(["https://low.com/"], Priority::Low, 0, None);

    assert_eq!(
        frontier.next_batch(3),
        vec![
            "https://high.com/".to_string(),
            "https://medium.com/".to_string(),
            "https://low.com/".to_string(),
        ]
    );
}

#[test]
fn test_ordering_within_priority_by_depth_then_admission() {
    let frontier = frontier_with(3, 3, 0);
    frontier.admit(["https://c.com/"], Priority::Medium, 2, None);
    frontier.admit(["https://a.com/"], Priority::Medium, 1, None);
    frontier.admit(["https://b.com/"], Priority::Medium, 1, None);
    frontier.admit(["https://d.com/"], Priority::Low, 0, None);

    assert_eq!(
        frontier.next_batch(4),
        vec![
            "https://a.com/".to_string(),
            "https://b.com/".to_string(),
            "https://c.com/".to_string(),
            "https://d.com/".to_string(),
        ]
    );
}

#[test]
fn test_single_domain_capped_per_batch() {
    let frontier = frontier_with(3, 3, 0);
    let urls: Vec<String> = (0..10).map(|i| format!("https://busy.com/{}", i)).collect();
    frontier.admit(&urls, Priority::Medium, 0, None);
    frontier.admit(["https://quiet.com/"], Priority::Low, 0, None);

    // ceil(8 / 4) = 2 slots for busy.com
    let batch = frontier.next_batch(8);
    let busy = batch.iter().filter(|u| u.contains("busy.com")).count();
    assert_eq!(busy, 2);
    assert!(batch.contains(&"https://quiet.com/".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limiting() {
    let frontier = frontier_with(3, 3, 1000);
    frontier.admit(
        ["https://a.com/one", "https://a.com/two"],
        Priority::Medium,
        0,
        None,
    );

    let first = frontier.next_batch(2);
    assert_eq!(first, vec!["https://a.com/one".to_string()]);

    tokio::time::advance(Duration::from_millis(500)).await;
    assert!(frontier.next_batch(2).is_empty());
    let wait = frontier.next_ready_in().expect("one URL still pending");
    assert_eq!(wait, Duration::from_millis(500));

    frontier.report(&first[0], true, None, Duration::from_millis(20));
    tokio::time::advance(Duration::from_millis(500)).await;

    assert_eq!(
        frontier.next_batch(2),
        vec!["https://a.com/two".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_growth_and_reset() {
    let frontier = frontier_with(3, 2, 0);
    let failing = ["https://flaky.com/1", "https://flaky.com/2", "https://flaky.com/3"];
    frontier.admit(failing, Priority::Medium, 0, None);

    // Each URL exhausts its two attempts
    for _ in 0..2 {
        let batch = frontier.next_batch(12);
        assert_eq!(batch.len(), 3);
        for url in &batch {
            frontier.report(url, false, Some("HTTP 503"), Duration::ZERO);
        }
    }

    let stats = frontier.domain_stats();
    let flaky = &stats["flaky.com"];
    assert_eq!(flaky.consecutive_failures, 3);
    assert!(flaky.in_backoff);
    assert_eq!(flaky.backoff_remaining, Some(Duration::from_secs(120)));
    assert_eq!(frontier.status().failed, 3);

    // Backed-off domains are skipped regardless of spacing
    frontier.admit(["https://flaky.com/4"], Priority::High, 0, None);
    assert!(frontier.next_batch(4).is_empty());

    tokio::time::advance(Duration::from_secs(121)).await;
    let batch = frontier.next_batch(4);
    assert_eq!(batch, vec!["https://flaky.com/4".to_string()]);
    frontier.report(&batch[0], true, None, Duration::from_millis(5));

    let stats = frontier.domain_stats();
    let flaky = &stats["flaky.com"];
    assert_eq!(flaky.consecutive_failures, 0);
    assert!(!flaky.in_backoff);
    assert_eq!(flaky.backoff_remaining, None);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_with_further_failures() {
    let frontier = frontier_with(3, 1, 0);
    let urls: Vec<String> = (0..4).map(|i| format!("https://down.com/{}", i)).collect();
    frontier.admit(&urls, Priority::Medium, 0, None);

    for _ in 0..3 {
        let batch = frontier.next_batch(1);
        frontier.report(&batch[0], false, Some("timeout"), Duration::ZERO);
    }
    assert_eq!(
        frontier.domain_stats()["down.com"].backoff_remaining,
        Some(Duration::from_secs(120))
    );

    tokio::time::advance(Duration::from_secs(120)).await;
    let batch = frontier.next_batch(1);
    frontier.report(&batch[0], false, Some("timeout"), Duration::ZERO);

    let down = &frontier.domain_stats()["down.com"];
    assert_eq!(down.consecutive_failures, 4);
    assert_eq!(down.backoff_remaining, Some(Duration::from_secs(240)));
}

#[test]
fn test_retry_ceiling() {
    let frontier = frontier_with(3, 3, 0);
    let url = "https://a.com/broken";
    frontier.admit([url], Priority::Medium, 0, None);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let batch = frontier.next_batch(1);
        assert_eq!(batch, vec![url.to_string()]);
        assert!(frontier.report(url, false, Some("HTTP 500"), Duration::ZERO));
        statuses.push(frontier.record(url).unwrap().status);
    }
    assert_eq!(
        statuses,
        vec![UrlStatus::Pending, UrlStatus::Pending, UrlStatus::Failed]
    );

    // Further reports on a terminal record change nothing
    assert!(!frontier.report(url, false, Some("HTTP 500"), Duration::ZERO));
    assert!(!frontier.report(url, true, None, Duration::ZERO));

    let record = frontier.record(url).unwrap();
    assert_eq!(record.status, UrlStatus::Failed);
    assert_eq!(record.retry_count, 3);
    assert_eq!(record.last_error.as_deref(), Some("HTTP 500"));
    assert!(frontier.next_batch(1).is_empty());
}

#[test]
fn test_reset_failed_restores_budget() {
    let frontier = frontier_with(3, 1, 0);
    frontier.admit(["https://a.com/x"], Priority::Medium, 0, None);
    let batch = frontier.next_batch(1);
    frontier.report(&batch[0], false, Some("HTTP 502"), Duration::ZERO);

    let failed = frontier.failed_urls();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].retry_count, 1);

    assert_eq!(frontier.reset_failed(), 1);
    let record = frontier.record("https://a.com/x").unwrap();
    assert_eq!(record.status, UrlStatus::Pending);
    assert_eq!(record.retry_count, 0);
    assert_eq!(frontier.next_batch(1), vec!["https://a.com/x".to_string()]);
}

#[test]
fn test_discovery_depth_gating() {
    let frontier = frontier_with(2, 3, 0);
    let feedback = DiscoveryFeedback::default();
    let links = vec!["/child".to_string()];

    assert_eq!(feedback.feed(&frontier, "https://a.com/top", 2, &links), 0);
    assert_eq!(frontier.status().total_urls, 0);

    assert_eq!(feedback.feed(&frontier, "https://a.com/mid", 1, &links), 1);
    let child = frontier.record("https://a.com/child").unwrap();
    assert_eq!(child.depth, 2);
    assert_eq!(child.discovered_from.as_deref(), Some("https://a.com/mid"));
    assert_eq!(frontier.status().discovered, 1);
}

#[test]
fn test_no_double_dispatch_across_threads() {
    let frontier = Arc::new(frontier_with(3, 3, 0));
    let urls: Vec<String> = (0..400)
        .map(|i| format!("https://site{}.com/page", i))
        .collect();
    frontier.admit(&urls, Priority::Medium, 0, None);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let frontier = Arc::clone(&frontier);
            std::thread::spawn(move || {
                let mut taken = Vec::new();
                loop {
                    let batch = frontier.next_batch(7);
                    if batch.is_empty() {
                        break;
                    }
                    taken.extend(batch);
                }
                taken
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut total = 0;
    for handle in handles {
        for url in handle.join().unwrap() {
            assert!(seen.insert(url.clone()), "{} dispatched twice", url);
            total += 1;
        }
    }

    assert_eq!(total, 400);
    assert_eq!(frontier.status().processing, 400);
}

#[tokio::test(start_paused = true)]
async fn test_stale_processing_reclaimed() {
    let frontier = frontier_with(3, 3, 0);
    frontier.admit(["https://a.com/"], Priority::Medium, 0, None);
    assert_eq!(frontier.next_batch(1).len(), 1);

    tokio::time::advance(Duration::from_secs(299)).await;
    assert!(frontier.next_batch(1).is_empty());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(frontier.next_batch(1), vec!["https://a.com/".to_string()]);
    assert_eq!(frontier.record("https://a.com/").unwrap().retry_count, 0);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = FrontierConfig {
        max_depth: -1,
        ..FrontierConfig::default()
    };
    let filter = UrlFilter::new(&FilterConfig::default()).unwrap();
    assert!(Frontier::new(config, filter).is_err());

    let bad_filter = FilterConfig {
        skip_patterns: vec!["(unclosed".to_string()],
        ..FilterConfig::default()
    };
    assert!(UrlFilter::new(&bad_filter).is_err());
}

#[test]
fn test_zero_stale_timeout_rejected_at_construction() {
    let config = FrontierConfig {
        stale_processing_timeout: 0,
        ..FrontierConfig::default()
    };
    let filter = UrlFilter::new(&FilterConfig::default()).unwrap();
    assert!(Frontier::new(config, filter).is_err());

    let mut full = Config::default();
    full.frontier.stale_processing_timeout = 1;
    full.scheduler.fetch_timeout = 30;
    assert!(validate(&full).is_err());
}
