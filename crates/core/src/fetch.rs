//! Feed retrieval from URLs, files, and readers.
//!
//! URL fetching goes through the [`HttpClient`] trait so that callers (and
//! tests) can supply their own transport. [`ReqwestClient`] is the default
//! implementation, available with the `fetch` feature.

use std::fs;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use url::Url;

use crate::error::{ReadError, Result};

/// HTTP client configuration for fetching feeds.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: format!("Syndicate/{} (feed reader)", env!("CARGO_PKG_VERSION")) }
    }
}

/// Transport used to GET feed bodies.
///
/// Implementations must report any non-success outcome as an error; an empty
/// body is only valid if the server really sent one.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the body of `url`
    async fn get(&self, url: &Url) -> Result<Vec<u8>>;

    /// Name used in log output
    fn name(&self) -> &str {
        "unknown"
    }
}

/// [`HttpClient`] backed by `reqwest`
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl ReqwestClient {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(feature = "fetch")]
#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        use std::time::Duration;

        let timeout = self.config.timeout;
        let transport = |e: reqwest::Error| {
            if e.is_timeout() { ReadError::Timeout { timeout } } else { ReadError::Transport(Box::new(e)) }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(transport)?;

        let response = client
            .get(url.clone())
            .header("User-Agent", &self.config.user_agent)
            .header(
                "Accept",
                "application/atom+xml,application/rss+xml,application/rdf+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReadError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}

/// Parse `input` as an absolute http(s) URL
pub fn parse_url(input: &str) -> Result<Url> {
    let url = Url::parse(input).map_err(|e| ReadError::InvalidUrl(format!("{}: {}", input, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ReadError::InvalidUrl(format!("unsupported scheme '{}' in {}", scheme, input))),
    }
}

/// Reads feed bytes from a local file.
pub fn fetch_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(ReadError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

/// Reads feed bytes from any reader until EOF.
pub fn fetch_reader<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Reads feed bytes from standard input.
pub fn fetch_stdin() -> Result<Vec<u8>> {
    fetch_reader(std::io::stdin().lock())
}
