//! Local HTTP fixtures for async tests.
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{AppError, AppResult};

pub(crate) struct TestServer {
    pub(crate) url: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Keep-alive server answering every request with `status` and a two-byte
/// body after waiting `delay`.
pub(crate) async fn spawn_test_server(status: u16, delay: Duration) -> AppResult<TestServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let mut connections = JoinSet::new();
        while let Ok((stream, _)) = listener.accept().await {
            connections.spawn(serve_connection(stream, status, delay));
        }
    });

    Ok(TestServer {
        url: format!("http://{}/", addr),
        handle,
    })
}

/// URL of a loopback port with nothing listening on it.
pub(crate) fn closed_port_url() -> AppResult<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

pub(crate) fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: std::future::Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

async fn serve_connection(mut stream: TcpStream, status: u16, delay: Duration) {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let Some(header_end) = find_header_end(&buffer) else {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(bytes) => {
                    buffer.extend_from_slice(chunk.get(..bytes).unwrap_or_default());
                    continue;
                }
            }
        };

        let request_end = header_end
            .saturating_add(4)
            .saturating_add(content_length(buffer.get(..header_end).unwrap_or_default()));
        while buffer.len() < request_end {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(bytes) => buffer.extend_from_slice(chunk.get(..bytes).unwrap_or_default()),
            }
        }
        buffer.drain(..request_end);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK",
            status
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
