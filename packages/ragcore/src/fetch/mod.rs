//! Fetcher: HTTP GET with timeout, size cap, content-type discrimination,
//! and redirect validation.
//!
//! Grounded on the teacher's `HttpIngestor::fetch_url_with_html`,
//! generalized into a standalone streaming fetch that aborts mid-stream
//! once the byte budget is exceeded (no post-hoc length check) and
//! re-validates every redirect hop against the `UrlValidator`.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::security::UrlValidator;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub final_url: String,
    pub status: u16,
}

/// HTTP fetcher with SSRF-safe redirect handling.
///
/// `reqwest`'s default redirect policy is disabled; this type follows
/// redirects manually (up to `MAX_REDIRECTS`) so that the validator runs
/// on every hop, not just the initial URL.
pub struct Fetcher {
    client: reqwest::Client,
    user_agent: String,
    validator: Arc<UrlValidator>,
}

impl Fetcher {
    pub fn new(validator: Arc<UrlValidator>) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build http client");
        Self {
            client,
            user_agent: "RagCoreBot/1.0".to_string(),
            validator,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub async fn fetch(&self, url: &str, timeout: Duration, max_bytes: usize) -> CrawlResult<FetchedContent> {
        let mut current = self.validator.validate_with_dns(url).await?;

        for _ in 0..=MAX_REDIRECTS {
            let response = tokio::time::timeout(
                timeout,
                self.client.get(&current).header("User-Agent", &self.user_agent).send(),
            )
            .await
            .map_err(|_| CrawlError::FetchTimeout)?
            .map_err(|e| CrawlError::Http(e.to_string()))?;

            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| CrawlError::Http("redirect with no location header".into()))?;
                let next = url::Url::parse(&current)
                    .and_then(|base| base.join(location))
                    .map_err(|e| CrawlError::Security(e.into()))?;
                debug!(from = %current, to = %next, "following redirect");
                current = self.validator.validate_with_dns(next.as_str()).await?;
                continue;
            }

            if !status.is_success() {
                return Err(CrawlError::Http(format!("http {status}")));
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());
            let final_url = response.url().to_string();

            let bytes = read_capped(response, max_bytes, timeout).await?;

            return Ok(FetchedContent {
                bytes,
                content_type,
                final_url,
                status: status.as_u16(),
            });
        }

        Err(CrawlError::Http("too many redirects".into()))
    }
}

async fn read_capped(response: reqwest::Response, max_bytes: usize, timeout: Duration) -> CrawlResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut stream = response.bytes_stream();

    let fut = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CrawlError::Http(e.to_string()))?;
            buf.extend_from_slice(&chunk);
            if buf.len() > max_bytes {
                warn!(max_bytes, "fetch exceeded byte budget, aborting stream");
                return Err(CrawlError::TooLarge);
            }
        }
        Ok(())
    };

    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| CrawlError::FetchTimeout)??;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
    }
}
