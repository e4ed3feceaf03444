use reqwest::{
    Client, Method, Request,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use url::Url;

use crate::config::RunConfig;
use crate::error::HttpError;

/// Immutable prototype from which every attempt's request is derived.
#[derive(Debug)]
pub struct RequestTemplate {
    request: Request,
}

impl RequestTemplate {
    /// Builds and checks the prototype for a run.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed URL, a scheme other than http/https,
    /// an invalid method or header, or a request that cannot be cloned.
    pub fn new(client: &Client, config: &RunConfig) -> Result<Self, HttpError> {
        let url = Url::parse(config.url()).map_err(|err| HttpError::InvalidUrl {
            url: config.url().to_owned(),
            source: err,
        })?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(HttpError::UnsupportedScheme {
                    scheme: other.to_owned(),
                });
            }
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(HttpError::UrlMissingHost {
                url: config.url().to_owned(),
            });
        }

        let method = Method::from_bytes(config.method().as_bytes()).map_err(|err| {
            HttpError::InvalidMethod {
                method: config.method().to_owned(),
                source: err,
            }
        })?;

        let mut headers = HeaderMap::with_capacity(config.headers().len());
        for (name, value) in config.headers() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                    HttpError::InvalidHeaderName {
                        name: name.clone(),
                        source: err,
                    }
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| HttpError::InvalidHeaderValue {
                    name: name.clone(),
                    source: err,
                })?;
            headers.append(header_name, header_value);
        }

        let mut request_builder = client.request(method, url).headers(headers);
        if let Some(body) = config.body() {
            request_builder = request_builder.body(body.to_owned());
        }
        let request = request_builder
            .build()
            .map_err(|err| HttpError::BuildRequestFailed { source: err })?;

        if request.try_clone().is_none() {
            return Err(HttpError::CloneRequestFailed);
        }

        Ok(Self { request })
    }

    /// Returns a fresh copy for one attempt.
    #[must_use]
    pub fn derive(&self) -> Option<Request> {
        self.request.try_clone()
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        self.request.url()
    }
}
