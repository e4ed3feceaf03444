use std::collections::BTreeMap;
use std::time::Duration;

use crate::metrics::{MetricsSnapshot, NETWORK_ERROR_LABEL, NETWORK_ERROR_STATUS};

/// Elapsed time never divides throughput by less than this.
const MIN_ELAPSED: Duration = Duration::from_micros(100);
const PERCENT_DIVISOR: u128 = 100;
const PERCENTILE_P50: u64 = 50;
const PERCENTILE_P90: u64 = 90;
const PERCENTILE_P99: u64 = 99;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_requests: u64,
    pub success: u64,
    pub errors: u64,
    pub elapsed: Duration,
    pub throughput_rps: f64,
    pub min_latency: Duration,
    pub mean_latency: Duration,
    pub p50_latency: Duration,
    pub p90_latency: Duration,
    pub p99_latency: Duration,
    pub max_latency: Duration,
    /// Status code (or `NetworkError`) to count.
    pub status_codes: BTreeMap<String, u64>,
}

/// Derives the report for a finished run. Pure; the snapshot is not changed.
#[must_use]
pub fn build_report(snapshot: &MetricsSnapshot, elapsed: Duration) -> Report {
    let latencies = snapshot.latencies();

    Report {
        total_requests: snapshot.total,
        success: snapshot.success,
        errors: snapshot.errors,
        elapsed,
        throughput_rps: throughput(snapshot.total, elapsed),
        min_latency: latencies.first().copied().unwrap_or_default(),
        mean_latency: mean(latencies),
        p50_latency: percentile(latencies, PERCENTILE_P50),
        p90_latency: percentile(latencies, PERCENTILE_P90),
        p99_latency: percentile(latencies, PERCENTILE_P99),
        max_latency: latencies.last().copied().unwrap_or_default(),
        status_codes: status_labels(&snapshot.status_codes),
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "throughput is reported as a fractional rate"
)]
fn throughput(total: u64, elapsed: Duration) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total as f64 / elapsed.max(MIN_ELAPSED).as_secs_f64()
}

fn mean(latencies: &[Duration]) -> Duration {
    let count = u128::try_from(latencies.len()).unwrap_or(u128::MAX);
    let total_nanos = latencies
        .iter()
        .fold(0u128, |sum, latency| sum.saturating_add(latency.as_nanos()));
    let mean_nanos = total_nanos.checked_div(count).unwrap_or(0);
    Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX))
}

/// Nearest-rank percentile over an ascending slice: index `floor(n * p)`,
/// clamped to the last element.
pub(crate) fn percentile(sorted: &[Duration], percentile: u64) -> Duration {
    let Some(last_index) = sorted.len().checked_sub(1) else {
        return Duration::ZERO;
    };
    let count = u128::try_from(sorted.len()).unwrap_or(u128::MAX);
    let index = u128::from(percentile)
        .saturating_mul(count)
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0);
    let idx = usize::try_from(index).map_or(last_index, |idx| idx.min(last_index));
    sorted.get(idx).copied().unwrap_or_default()
}

fn status_labels(status_codes: &BTreeMap<u16, u64>) -> BTreeMap<String, u64> {
    status_codes
        .iter()
        .map(|(code, count)| {
            let label = if *code == NETWORK_ERROR_STATUS {
                NETWORK_ERROR_LABEL.to_owned()
            } else {
                code.to_string()
            };
            (label, *count)
        })
        .collect()
}

/// Milliseconds with two decimals, e.g. `12.35ms`.
#[must_use]
pub fn format_latency(latency: Duration) -> String {
    let hundredths = latency.as_micros().saturating_add(5) / 10;
    format!("{}.{:02}ms", hundredths / 100, hundredths % 100)
}

fn success_rate_x100(report: &Report) -> u64 {
    let scaled = u128::from(report.success)
        .saturating_mul(10_000)
        .checked_div(u128::from(report.total_requests))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub(crate) fn render_summary(report: &Report) -> Vec<String> {
    let rate = success_rate_x100(report);
    let elapsed_ms = report.elapsed.as_millis();
    let mut lines = vec![
        format!("Duration: {}.{:03}s", elapsed_ms / 1000, elapsed_ms % 1000),
        format!("Total Requests: {}", report.total_requests),
        format!(
            "Successful: {} ({}.{:02}%)",
            report.success,
            rate / 100,
            rate % 100
        ),
        format!("Errors: {}", report.errors),
        format!("Throughput: {:.2} req/s", report.throughput_rps),
    ];

    if report.total_requests == 0 {
        lines.push("No requests completed.".to_owned());
        return lines;
    }

    lines.push(format!(
        "Latency min/mean/max: {} / {} / {}",
        format_latency(report.min_latency),
        format_latency(report.mean_latency),
        format_latency(report.max_latency)
    ));
    lines.push(format!(
        "Latency p50/p90/p99: {} / {} / {}",
        format_latency(report.p50_latency),
        format_latency(report.p90_latency),
        format_latency(report.p99_latency)
    ));
    lines.push("Status Codes:".to_owned());
    for (label, count) in &report.status_codes {
        lines.push(format!("  {}: {}", label, count));
    }
    lines
}

pub(crate) fn print_summary(report: &Report) {
    for line in render_summary(report) {
        println!("{}", line);
    }
}
