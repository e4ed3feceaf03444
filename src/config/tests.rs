use super::loader::load_config_file;
use super::{
    RunConfig, RunInput, apply_config, capacity_estimate,
    types::{ConfigFile, DurationValue},
};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::{MAX_CONCURRENCY, OutputFormat, PositiveUsize, TesterArgs};
use crate::error::ValidationError;

fn input(url: &str) -> RunInput {
    RunInput {
        url: Some(url.to_owned()),
        ..RunInput::default()
    }
}

fn parse_with_matches(argv: &[&str]) -> Result<(TesterArgs, clap::ArgMatches), String> {
    let matches = TesterArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let args =
        TesterArgs::from_arg_matches(&matches).map_err(|err| format!("args failed: {}", err))?;
    Ok((args, matches))
}

#[test]
fn run_config_applies_defaults() -> Result<(), String> {
    let config = RunConfig::from_input(input("http://localhost:8080/"))?;

    if config.url() != "http://localhost:8080/" {
        return Err(format!("Unexpected url: {}", config.url()));
    }
    if config.method() != "GET" {
        return Err(format!("Unexpected method: {}", config.method()));
    }
    if config.concurrency() != 50 {
        return Err(format!("Unexpected concurrency: {}", config.concurrency()));
    }
    if config.duration() != Duration::from_secs(10) {
        return Err("Unexpected duration".to_owned());
    }
    if config.timeout() != Duration::from_secs(5) {
        return Err("Unexpected timeout".to_owned());
    }
    if !config.keep_alive() || config.verify_tls() {
        return Err("Unexpected connection defaults".to_owned());
    }
    Ok(())
}

#[test]
fn run_config_requires_url() -> Result<(), String> {
    for url in [None, Some(String::new()), Some("   ".to_owned())] {
        let result = RunConfig::from_input(RunInput {
            url,
            ..RunInput::default()
        });
        if !matches!(result, Err(ValidationError::MissingUrl)) {
            return Err("Expected MissingUrl".to_owned());
        }
    }
    Ok(())
}

#[test]
fn run_config_replaces_non_positive_values() -> Result<(), String> {
    for concurrency in [0, -5] {
        let config = RunConfig::from_input(RunInput {
            concurrency: Some(concurrency),
            duration: Some(Duration::ZERO),
            timeout: Some(Duration::ZERO),
            ..input("http://localhost")
        })?;
        if config.concurrency() != 50 {
            return Err(format!("Unexpected concurrency: {}", config.concurrency()));
        }
        if config.duration() != Duration::from_secs(10) {
            return Err("Unexpected duration".to_owned());
        }
        if config.timeout() != Duration::from_secs(5) {
            return Err("Unexpected timeout".to_owned());
        }
    }
    Ok(())
}

#[test]
fn run_config_rejects_oversized_concurrency() -> Result<(), String> {
    let max = i64::try_from(MAX_CONCURRENCY).map_err(|err| format!("max: {}", err))?;
    for concurrency in [max.saturating_add(1), 1_000_000_000, i64::MAX] {
        let result = RunConfig::from_input(RunInput {
            concurrency: Some(concurrency),
            ..input("http://localhost")
        });
        if !matches!(
            result,
            Err(ValidationError::ConcurrencyTooLarge { value, .. }) if value == concurrency
        ) {
            return Err(format!("Expected {} workers to be rejected", concurrency));
        }
    }

    let config = RunConfig::from_input(RunInput {
        concurrency: Some(max),
        ..input("http://localhost")
    })?;
    if config.concurrency() != MAX_CONCURRENCY {
        return Err(format!("Unexpected concurrency: {}", config.concurrency()));
    }
    Ok(())
}

#[test]
fn run_config_keeps_explicit_values() -> Result<(), String> {
    let config = RunConfig::from_input(RunInput {
        method: Some(" post ".to_owned()),
        concurrency: Some(3),
        duration: Some(Duration::from_millis(1500)),
        timeout: Some(Duration::from_millis(200)),
        disable_keepalive: true,
        verify_tls: true,
        body: Some("payload".to_owned()),
        ..input("  https://example.test/x  ")
    })?;

    if config.url() != "https://example.test/x" {
        return Err(format!("URL was not trimmed: {}", config.url()));
    }
    if config.method() != "POST" {
        return Err(format!("Unexpected method: {}", config.method()));
    }
    if config.concurrency() != 3 {
        return Err("Unexpected concurrency".to_owned());
    }
    if config.duration() != Duration::from_millis(1500) {
        return Err("Unexpected duration".to_owned());
    }
    if config.timeout() != Duration::from_millis(200) {
        return Err("Unexpected timeout".to_owned());
    }
    if config.keep_alive() || !config.verify_tls() {
        return Err("Unexpected connection flags".to_owned());
    }
    if config.body() != Some("payload") {
        return Err("Unexpected body".to_owned());
    }
    Ok(())
}

#[test]
fn capacity_estimate_scales_and_caps() -> Result<(), String> {
    let cases = [
        (10, Duration::from_secs(1), 1_000),
        (50, Duration::from_secs(10), 50_000),
        (2, Duration::from_millis(1500), 400),
        (4, Duration::from_millis(10), 400),
        (0, Duration::from_secs(10), 10_000),
        (100_000, Duration::from_secs(3600), 4_194_304),
        (usize::MAX, Duration::from_secs(10), 4_194_304),
    ];
    for (workers, duration, expected) in cases {
        let estimate = capacity_estimate(workers, duration);
        if estimate != expected {
            return Err(format!(
                "Estimate for {} workers over {:?}: {} (expected {})",
                workers, duration, estimate, expected
            ));
        }
    }
    Ok(())
}

#[test]
fn parse_toml_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadblast.toml");
    let content = r#"
url = "http://localhost:3000"
method = "put"
concurrency = 8
duration = "2m"
timeout = 3
headers = ["X-Test: 1"]
disable_keepalive = true
output_format = "json"
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path)?;
    if config.url.as_deref() != Some("http://localhost:3000") {
        return Err("Unexpected url".to_owned());
    }
    if config.concurrency != Some(8) {
        return Err("Unexpected concurrency".to_owned());
    }
    let duration = config
        .duration
        .as_ref()
        .ok_or_else(|| "Expected duration".to_owned())?
        .to_duration()?;
    if duration != Duration::from_secs(120) {
        return Err(format!("Unexpected duration: {:?}", duration));
    }
    let timeout = config
        .timeout
        .as_ref()
        .ok_or_else(|| "Expected timeout".to_owned())?
        .to_duration()?;
    if timeout != Duration::from_secs(3) {
        return Err(format!("Unexpected timeout: {:?}", timeout));
    }
    if config.output_format != Some(OutputFormat::Json) {
        return Err("Unexpected output format".to_owned());
    }
    Ok(())
}

#[test]
fn parse_json_config_with_aliases() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadblast.json");
    let content = r#"{
  "target_url": "http://localhost:3000",
  "workers": 12,
  "duration": "500ms",
  "data": "hello"
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path)?;
    if config.url.as_deref() != Some("http://localhost:3000") {
        return Err("Unexpected url".to_owned());
    }
    if config.concurrency != Some(12) {
        return Err("Unexpected concurrency".to_owned());
    }
    if config.body.as_deref() != Some("hello") {
        return Err("Unexpected body".to_owned());
    }
    Ok(())
}

#[test]
fn load_config_rejects_unknown_extension() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("loadblast.yaml");
    std::fs::write(&path, "url: x").map_err(|err| format!("write failed: {}", err))?;

    if load_config_file(&path).is_ok() {
        return Err("Expected unsupported extension error".to_owned());
    }
    Ok(())
}

#[test]
fn zero_duration_in_config_is_rejected() -> Result<(), String> {
    if DurationValue::Seconds(0).to_duration().is_ok() {
        return Err("Expected zero seconds to fail".to_owned());
    }
    if DurationValue::Text("0ms".to_owned()).to_duration().is_ok() {
        return Err("Expected 0ms to fail".to_owned());
    }
    Ok(())
}

#[test]
fn apply_config_prefers_cli_values() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&[
        "loadblast",
        "-u",
        "http://cli.test",
        "-c",
        "4",
        "--output-format",
        "quiet",
    ])?;
    let config = ConfigFile {
        url: Some("http://file.test".to_owned()),
        method: Some("DELETE".to_owned()),
        concurrency: Some(40),
        timeout: Some(DurationValue::Text("250ms".to_owned())),
        verify_tls: Some(true),
        output_format: Some(OutputFormat::Json),
        ..ConfigFile::default()
    };

    apply_config(&mut args, &matches, &config)?;

    if args.url.as_deref() != Some("http://cli.test") {
        return Err("CLI url should win".to_owned());
    }
    if args.concurrency.map(PositiveUsize::get) != Some(4) {
        return Err("CLI concurrency should win".to_owned());
    }
    if args.output_format != OutputFormat::Quiet {
        return Err("CLI output format should win".to_owned());
    }
    if args.method.as_deref() != Some("DELETE") {
        return Err("Config method should fill the gap".to_owned());
    }
    if args.timeout != Some(Duration::from_millis(250)) {
        return Err("Config timeout should fill the gap".to_owned());
    }
    if !args.verify_tls {
        return Err("Config verify_tls should apply".to_owned());
    }
    Ok(())
}

#[test]
fn apply_config_rejects_zero_concurrency() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["loadblast"])?;
    let config = ConfigFile {
        concurrency: Some(0),
        ..ConfigFile::default()
    };
    if apply_config(&mut args, &matches, &config).is_ok() {
        return Err("Expected zero concurrency to fail".to_owned());
    }
    Ok(())
}
