use super::worker::attempt;
use super::*;
use crate::config::{RunConfig, RunInput};
use crate::error::{AppError, AppResult, HttpError};
use crate::metrics::{Metrics, NETWORK_ERROR_STATUS, OutcomeClass};
use crate::shutdown::shutdown_token;
use crate::test_support::{closed_port_url, run_async_test, spawn_test_server};
use std::sync::Arc;
use std::time::Duration;

fn run_config(url: &str) -> AppResult<RunConfig> {
    Ok(RunConfig::from_input(RunInput {
        url: Some(url.to_owned()),
        concurrency: Some(2),
        timeout: Some(Duration::from_millis(500)),
        ..RunInput::default()
    })?)
}

fn template_for(config: &RunConfig) -> AppResult<RequestTemplate> {
    let client = build_client(config)?;
    Ok(RequestTemplate::new(&client, config)?)
}

#[test]
fn template_rejects_malformed_url() -> AppResult<()> {
    let config = run_config("not a url")?;
    if !matches!(
        template_for(&config),
        Err(AppError::Http(HttpError::InvalidUrl { .. }))
    ) {
        return Err(AppError::validation("Expected InvalidUrl"));
    }
    Ok(())
}

#[test]
fn template_rejects_unsupported_scheme() -> AppResult<()> {
    let config = run_config("ftp://example.test/file")?;
    if !matches!(
        template_for(&config),
        Err(AppError::Http(HttpError::UnsupportedScheme { .. }))
    ) {
        return Err(AppError::validation("Expected UnsupportedScheme"));
    }
    Ok(())
}

#[test]
fn template_rejects_invalid_method() -> AppResult<()> {
    let config = RunConfig::from_input(RunInput {
        url: Some("http://localhost/".to_owned()),
        method: Some("GE T".to_owned()),
        ..RunInput::default()
    })?;
    if !matches!(
        template_for(&config),
        Err(AppError::Http(HttpError::InvalidMethod { .. }))
    ) {
        return Err(AppError::validation("Expected InvalidMethod"));
    }
    Ok(())
}

#[test]
fn template_rejects_invalid_header_value() -> AppResult<()> {
    let config = RunConfig::from_input(RunInput {
        url: Some("http://localhost/".to_owned()),
        headers: vec![("X-Bad".to_owned(), "line\nbreak".to_owned())],
        ..RunInput::default()
    })?;
    if !matches!(
        template_for(&config),
        Err(AppError::Http(HttpError::InvalidHeaderValue { .. }))
    ) {
        return Err(AppError::validation("Expected InvalidHeaderValue"));
    }
    Ok(())
}

#[test]
fn template_derives_independent_copies() -> AppResult<()> {
    let config = RunConfig::from_input(RunInput {
        url: Some("http://localhost:9/health".to_owned()),
        method: Some("post".to_owned()),
        headers: vec![("X-Run".to_owned(), "7".to_owned())],
        body: Some("payload".to_owned()),
        ..RunInput::default()
    })?;
    let template = template_for(&config)?;

    let first = template
        .derive()
        .ok_or_else(|| AppError::validation("derive failed"))?;
    let second = template
        .derive()
        .ok_or_else(|| AppError::validation("derive failed"))?;

    if first.method() != reqwest::Method::POST || template.method() != reqwest::Method::POST {
        return Err(AppError::validation("Unexpected method"));
    }
    if first.url() != second.url() || template.url().path() != "/health" {
        return Err(AppError::validation("Unexpected url"));
    }
    if first.headers().get("x-run").map(|value| value.as_bytes()) != Some(b"7".as_slice()) {
        return Err(AppError::validation("Header missing from derived request"));
    }
    let body = second
        .body()
        .and_then(reqwest::Body::as_bytes)
        .ok_or_else(|| AppError::validation("Body missing from derived request"))?;
    if body != b"payload" {
        return Err(AppError::validation("Unexpected body"));
    }
    Ok(())
}

#[test]
fn attempt_records_status_and_latency() -> AppResult<()> {
    run_async_test(async {
        let server = spawn_test_server(503, Duration::from_millis(20)).await?;
        let config = run_config(&server.url)?;
        let client = build_client(&config)?;
        let template = RequestTemplate::new(&client, &config)?;
        let request = template
            .derive()
            .ok_or_else(|| AppError::validation("derive failed"))?;

        let outcome = attempt(&client, request).await;
        if outcome.status != 503 || outcome.class != OutcomeClass::HttpFailure {
            return Err(AppError::validation(format!(
                "Unexpected outcome: {:?}",
                outcome
            )));
        }
        if outcome.latency < Duration::from_millis(20) {
            return Err(AppError::validation("Latency shorter than server delay"));
        }
        Ok(())
    })
}

#[test]
fn attempt_against_closed_port_is_transport_failure() -> AppResult<()> {
    run_async_test(async {
        let config = run_config(&closed_port_url()?)?;
        let client = build_client(&config)?;
        let template = RequestTemplate::new(&client, &config)?;
        let request = template
            .derive()
            .ok_or_else(|| AppError::validation("derive failed"))?;

        let outcome = attempt(&client, request).await;
        if outcome.status != NETWORK_ERROR_STATUS
            || outcome.class != OutcomeClass::TransportFailure
        {
            return Err(AppError::validation(format!(
                "Unexpected outcome: {:?}",
                outcome
            )));
        }
        Ok(())
    })
}

#[test]
fn worker_stops_on_cancel_and_records() -> AppResult<()> {
    run_async_test(async {
        let server = spawn_test_server(200, Duration::ZERO).await?;
        let config = run_config(&server.url)?;
        let client = build_client(&config)?;
        let template = Arc::new(RequestTemplate::new(&client, &config)?);
        let metrics = Arc::new(Metrics::with_capacity(64));
        let token = shutdown_token();

        let mut worker = Worker::new(
            0,
            client,
            Arc::clone(&template),
            Arc::clone(&metrics),
            token.clone(),
        );
        if worker.state() != WorkerState::Running || worker.id() != 0 {
            return Err(AppError::validation("Unexpected initial worker state"));
        }
        let handle = tokio::spawn(async move {
            let recorded = worker.run().await;
            (worker, recorded)
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
        let (worker, recorded) = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .map_err(|err| AppError::validation(format!("Worker did not stop: {}", err)))??;

        if worker.state() != WorkerState::Stopped {
            return Err(AppError::validation("Worker did not reach Stopped"));
        }
        let snapshot = metrics.snapshot();
        if recorded == 0 || snapshot.total != recorded || snapshot.success != recorded {
            return Err(AppError::validation(format!(
                "recorded {} but snapshot has {:?}",
                recorded, snapshot
            )));
        }
        Ok(())
    })
}

#[test]
fn cancelled_in_flight_attempt_is_not_recorded() -> AppResult<()> {
    run_async_test(async {
        let server = spawn_test_server(200, Duration::from_secs(3)).await?;
        let config = RunConfig::from_input(RunInput {
            url: Some(server.url.clone()),
            timeout: Some(Duration::from_secs(10)),
            ..RunInput::default()
        })?;
        let client = build_client(&config)?;
        let template = Arc::new(RequestTemplate::new(&client, &config)?);
        let metrics = Arc::new(Metrics::default());
        let token = shutdown_token();

        let mut worker = Worker::new(1, client, template, Arc::clone(&metrics), token.clone());
        let handle = tokio::spawn(async move { worker.run().await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
        let recorded = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .map_err(|err| AppError::validation(format!("Worker did not stop: {}", err)))??;

        if recorded != 0 || metrics.total() != 0 {
            return Err(AppError::validation("Abandoned attempt was recorded"));
        }
        Ok(())
    })
}
