//! Human-readable crawl statistics

use super::CrawlSummary;

/// Share of settled records that completed, in percent
pub fn success_rate(completed: usize, failed: usize) -> f64 {
    let settled = completed + failed;
    if settled == 0 {
        0.0
    } else {
        (completed as f64 / settled as f64) * 100.0
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    let status = &summary.status;
    let dispatch = &summary.dispatch;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs: {}", status.total_urls);
    println!("  Discovered from pages: {}", status.discovered);
    println!("  Domains: {}", status.domains_tracked);
    println!("  Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    println!("URLs by State:");
    for (label, count) in [
        ("Completed", status.completed),
        ("Failed", status.failed),
        ("Pending", status.pending),
        ("Processing", status.processing),
    ] {
        let percentage = if status.total_urls > 0 {
            (count as f64 / status.total_urls as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
    println!();

    println!("Dispatch:");
    println!("  Fetches: {}", dispatch.dispatched);
    println!("  Successes: {}", dispatch.successes);
    println!("  Failures: {}", dispatch.failures);
    println!(
        "  Average latency: {:.0}ms",
        dispatch.average_latency.as_secs_f64() * 1000.0
    );
    if dispatch.active_sessions > 0 {
        println!("  Active sessions: {}", dispatch.active_sessions);
    }
    println!();

    let backoff = summary.domains_in_backoff();
    if !backoff.is_empty() {
        println!("Domains in Backoff ({}):", backoff.len());
        for domain in backoff {
            let remaining = summary
                .domains
                .get(domain)
                .and_then(|d| d.backoff_remaining)
                .map(|r| r.as_secs())
                .unwrap_or(0);
            println!("  - {} ({}s remaining)", domain, remaining);
        }
        println!();
    }

    if !summary.failed.is_empty() {
        println!("Failed URLs ({}):", summary.failed.len());
        for failed in &summary.failed {
            println!(
                "  - {} after {} attempts: {}",
                failed.url,
                failed.retry_count,
                failed.last_error.as_deref().unwrap_or("unknown error")
            );
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} settled URLs completed)",
        success_rate(status.completed, status.failed),
        status.completed,
        status.completed + status.failed
    );
}
