//! Prometheus metrics for a pull-list run.
//!
//! This module provides metrics for:
//! - ILS requests (attempts and terminal failures per operation)
//! - Enrichment (holds dropped per lookup stage)
//! - Reports (rows written per partition, branch duration)

use std::path::Path;

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

// =============================================================================
// ILS Request Metrics
// =============================================================================

/// Request attempts by operation, retries included.
pub static REQUEST_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pullist_ils_request_attempts_total",
            "Total ILS request attempts, retries included",
        ),
        &["operation"], // "login", "pull_list", "hold_record", "item", "bib", "call", "patron"
    )
    .unwrap()
});

/// Requests that failed after exhausting retries, by operation.
pub static REQUEST_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pullist_ils_request_failures_total",
            "Total ILS requests that failed after all retries",
        ),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Enrichment Metrics
// =============================================================================

/// Holds dropped from a report because a lookup failed.
pub static HOLDS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pullist_holds_dropped_total",
            "Total holds left out of reports after a failed lookup",
        ),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Report Metrics
// =============================================================================

/// Rows written by branch and partition.
pub static ROWS_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pullist_rows_written_total", "Total report rows written"),
        &["branch", "report"], // report: "title", "item"
    )
    .unwrap()
});

/// Branch processing duration in seconds.
pub static BRANCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pullist_branch_duration_seconds",
            "Duration of one branch run, login to report",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(REQUEST_ATTEMPTS.clone()),
        Box::new(REQUEST_FAILURES.clone()),
        Box::new(HOLDS_DROPPED.clone()),
        Box::new(ROWS_WRITTEN.clone()),
        Box::new(BRANCH_DURATION.clone()),
    ]
}

/// Render all metrics in the Prometheus text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Write all metrics to a textfile-collector file.
///
/// The file is written next to its destination and renamed into place so a
/// scraper never sees a partial file.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let rendered = render().map_err(std::io::Error::other)?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, rendered)?;
    std::fs::rename(&tmp, path)
}
