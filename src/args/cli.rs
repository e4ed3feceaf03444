use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::defaults::{DEFAULT_LISTEN_ADDR, DEFAULT_SHUTDOWN_GRACE};
use super::parsers::{parse_duration_arg, parse_header, parse_positive_usize};
use super::types::{OutputFormat, PositiveUsize};

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the web UI and the JSON run API
    Serve(ServeArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, short = 'l', default_value = DEFAULT_LISTEN_ADDR, env = "LOADBLAST_LISTEN")]
    pub listen: String,

    /// How long to wait for in-flight requests on shutdown (supports ms/s/m/h)
    #[arg(
        long = "shutdown-grace",
        default_value = DEFAULT_SHUTDOWN_GRACE,
        value_parser = parse_duration_arg
    )]
    pub shutdown_grace: Duration,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Saturating async HTTP load generator - closed-loop workers, atomic metrics, nearest-rank latency reports."
)]
pub struct TesterArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Target URL for the load test
    #[arg(long, short, help_heading = "Target")]
    pub url: Option<String>,

    /// HTTP method to use (default: GET)
    #[arg(long, short = 'X', help_heading = "Target")]
    pub method: Option<String>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header, help_heading = "Target")]
    pub headers: Vec<(String, String)>,

    /// Request body sent with every request
    #[arg(long, alias = "data", help_heading = "Target")]
    pub body: Option<String>,

    /// Number of concurrent workers (default: 50)
    #[arg(
        long,
        short = 'c',
        alias = "workers",
        value_parser = parse_positive_usize,
        help_heading = "Load"
    )]
    pub concurrency: Option<PositiveUsize>,

    /// Test duration (supports ms/s/m/h, default: 10s)
    #[arg(long, short = 'd', value_parser = parse_duration_arg, help_heading = "Load")]
    pub duration: Option<Duration>,

    /// Per-request timeout (supports ms/s/m/h, default: 5s)
    #[arg(long, short = 't', value_parser = parse_duration_arg, help_heading = "Load")]
    pub timeout: Option<Duration>,

    /// Open a new connection for every request
    #[arg(long = "disable-keepalive", help_heading = "Connection")]
    pub disable_keepalive: bool,

    /// Verify TLS certificates and hostnames (skipped by default)
    #[arg(long = "verify-tls", help_heading = "Connection")]
    pub verify_tls: bool,

    /// Path to config file (TOML/JSON). Defaults to ./loadblast.toml or ./loadblast.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Report format printed to stdout
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text, help_heading = "Output")]
    pub output_format: OutputFormat,

    /// Write the JSON report to a file
    #[arg(long = "export-json", help_heading = "Output")]
    pub export_json: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by LOADBLAST_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
