// src/page/fetch.rs
// =============================================================================
// Downloads one page and returns its body as UTF-8 text.
//
// Key behaviour:
// - A single deadline covers connecting, sending and reading the whole body
// - Non-2xx responses are NOT errors: the body is returned anyway and the
//   status is logged, so error pages still get saved and parsed
// - The body is transcoded to UTF-8 (see charset.rs)
//
// One Fetcher (and therefore one reqwest Client with its connection pool) is
// shared by every worker.
// =============================================================================

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use super::charset;
use crate::error::FetchError;

const USER_AGENT: &str = concat!("mini-spider/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, timeout })
    }

    // Downloads `url` and returns the body as UTF-8
    //
    // Parameters:
    //   url: an absolute http(s) URL
    //
    // Returns: Ok(body) for any status code, or a FetchError when the request
    // could not be completed within the timeout
    //
    // Example:
    //   fetch("http://www.baidu.com") -> Ok("<!DOCTYPE html>...")
    //   fetch("www.baidu123.com")     -> Err(FetchError::Request { .. })
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.categorize(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "non-success status, keeping body");
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.categorize(url, e))?;

        debug!(url, bytes = body.len(), "fetched");
        Ok(charset::to_utf8(&body, content_type.as_deref()))
    }

    fn categorize(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: error,
            }
        }
    }
}
