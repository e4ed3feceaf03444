use std::collections::HashMap;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{AppError, AppResult, ServerError};

const MAX_REQUEST_BYTES: usize = 1024 * 1024;

pub(super) struct HttpRequest {
    pub(super) method: String,
    pub(super) path: String,
    pub(super) headers: HashMap<String, String>,
    pub(super) body: Vec<u8>,
}

#[derive(Debug)]
pub(super) struct ApiError {
    pub(super) status: u16,
    pub(super) message: String,
}

impl ApiError {
    pub(super) fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub(super) async fn read_http_request(socket: &mut TcpStream) -> Result<HttpRequest, ApiError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let header_end;

    loop {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ApiError::new(400, format!("Failed to read request: {}", err)))?;
        if bytes == 0 {
            return Err(ApiError::new(400, "Empty request"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| ApiError::new(400, "Invalid read length"))?;
        buffer.extend_from_slice(read_slice);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(ApiError::new(413, "Request too large"));
        }
        if let Some(pos) = find_header_end(&buffer) {
            header_end = pos;
            break;
        }
    }

    let header_bytes = buffer
        .get(..header_end)
        .ok_or_else(|| ApiError::new(400, "Malformed request headers"))?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| ApiError::new(400, format!("Invalid request encoding: {}", err)))?;
    let mut lines = header_text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| ApiError::new(400, "Missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| ApiError::new(400, "Missing HTTP method"))?;
    let target = parts
        .next()
        .ok_or_else(|| ApiError::new(400, "Missing request path"))?;
    let path = target.split_once('?').map_or(target, |(path, _query)| path);

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(ApiError::new(400, "Malformed header"));
        };
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    let content_length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_err| ApiError::new(400, "Invalid Content-Length"))?,
        None => 0,
    };
    if content_length > MAX_REQUEST_BYTES {
        return Err(ApiError::new(413, "Request body too large"));
    }
    let body_start = header_end
        .checked_add(4)
        .ok_or_else(|| ApiError::new(400, "Malformed request headers"))?;
    let mut body = buffer.get(body_start..).unwrap_or_default().to_vec();
    while body.len() < content_length {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| ApiError::new(400, format!("Failed to read body: {}", err)))?;
        if bytes == 0 {
            return Err(ApiError::new(400, "Truncated request body"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| ApiError::new(400, "Invalid read length"))?;
        body.extend_from_slice(read_slice);
    }
    body.truncate(content_length);

    Ok(HttpRequest {
        method: method.to_ascii_uppercase(),
        path: path.to_owned(),
        headers,
        body,
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

pub(super) const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

pub(super) async fn write_json_response<T: Serialize>(
    socket: &mut TcpStream,
    status: u16,
    response: &T,
) -> AppResult<()> {
    let body = serde_json::to_vec(response).map_err(|err| {
        AppError::server(ServerError::Serialize {
            context: "api response",
            source: err,
        })
    })?;
    write_response(socket, status, Some("application/json"), &body).await
}

pub(super) async fn write_html_response(
    socket: &mut TcpStream,
    status: u16,
    html: &str,
) -> AppResult<()> {
    write_response(
        socket,
        status,
        Some("text/html; charset=utf-8"),
        html.as_bytes(),
    )
    .await
}

pub(super) async fn write_empty_response(socket: &mut TcpStream, status: u16) -> AppResult<()> {
    write_response(socket, status, None, &[]).await
}

async fn write_response(
    socket: &mut TcpStream,
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> AppResult<()> {
    let content_type_line = content_type
        .map(|value| format!("Content-Type: {}\r\n", value))
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 {} {}\r\n{}Content-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: POST, GET, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        content_type_line,
        body.len()
    );
    socket.write_all(response.as_bytes()).await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "write api response",
            source: err,
        })
    })?;
    socket.write_all(body).await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "write api response body",
            source: err,
        })
    })?;
    socket.flush().await.map_err(|err| {
        AppError::server(ServerError::Io {
            context: "flush api response",
            source: err,
        })
    })?;
    Ok(())
}
