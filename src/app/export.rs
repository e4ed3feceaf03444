use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, BufWriter};

use super::summary::{Report, format_latency};

/// Wire form of a [`Report`], shared by the JSON output, the export file and
/// the HTTP API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub total_requests: u64,
    pub success: u64,
    pub errors: u64,
    pub throughput_rps: f64,
    pub min_latency: String,
    pub mean_latency: String,
    pub p50_latency: String,
    pub p90_latency: String,
    pub p99_latency: String,
    pub max_latency: String,
    pub status_codes: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl ReportResponse {
    #[must_use]
    pub fn from_report(report: &Report) -> Self {
        Self {
            total_requests: report.total_requests,
            success: report.success,
            errors: report.errors,
            throughput_rps: report.throughput_rps,
            min_latency: format_latency(report.min_latency),
            mean_latency: format_latency(report.mean_latency),
            p50_latency: format_latency(report.p50_latency),
            p90_latency: format_latency(report.p90_latency),
            p99_latency: format_latency(report.p99_latency),
            max_latency: format_latency(report.max_latency),
            status_codes: report.status_codes.clone(),
            error_msg: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error_msg: Some(message.into()),
            ..Self::default()
        }
    }
}

pub(crate) async fn export_json(path: &str, report: &ReportResponse) -> Result<(), std::io::Error> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    let json = serde_json::to_vec_pretty(report).map_err(std::io::Error::other)?;
    writer.write_all(&json).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
