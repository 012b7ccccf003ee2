//! HTTP transport
//!
//! Workers only see the [`Transport`] trait: fetch a URL, get back the
//! response headers and a body stream, or an error. Every error is final for
//! the job that triggered it; nothing here retries.

use crate::config::HttpConfig;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; driftnet/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Streaming response body
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout for {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    fn from_request(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Http(error)
        }
    }
}

/// A successful response: headers plus an unread body
pub struct FetchedPage {
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl FetchedPage {
    /// The raw `Content-Type` header, or an empty string if absent
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Fetches pages on behalf of workers
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Requests `url`, returning its headers and body stream
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed transport with timeout and optional proxy
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the HTTP client from the `[http]` config section
    ///
    /// # Example
    ///
    /// ```no_run
    /// use driftnet::config::HttpConfig;
    /// use driftnet::crawler::HttpTransport;
    ///
    /// let transport = HttpTransport::new(&HttpConfig::default()).unwrap();
    /// ```
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true);

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy).map_err(|e| FetchError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_request(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| FetchError::Body(e.to_string())))
            .boxed();

        Ok(FetchedPage { headers, body })
    }
}
