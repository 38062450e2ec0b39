//! Bounded BFS traversal, grounded on the teacher's
//! `HttpIngestor::discover` loop, extended with page/byte/time budget
//! tracking, progress-event emission, and `partial` completion semantics.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{CrawlError, CrawlResult};
use crate::extract::extract_html;
use crate::fetch::Fetcher;
use crate::types::{CrawlOptions, CrawlProgress};

use super::rate_limit::HostLimiters;
use super::robots::RobotsCache;

#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub base_url: String,
    pub pages: Vec<CrawledPage>,
    pub total_pages: u32,
    pub total_content_length: usize,
    pub summary: String,
    pub partial: bool,
}

/// Receives progress frames as the crawl advances. Implemented by the
/// progress bus at the orchestration layer; kept as a trait so the
/// crawler has no dependency on the bus's transport.
#[async_trait]
pub trait CrawlSink: Send + Sync {
    async fn emit(&self, progress: CrawlProgress);
}

pub struct NoopSink;

#[async_trait]
impl CrawlSink for NoopSink {
    async fn emit(&self, _progress: CrawlProgress) {}
}

pub struct Crawler {
    fetcher: Arc<Fetcher>,
    limiters: Arc<HostLimiters>,
    robots: Arc<RobotsCache>,
    robots_client: reqwest::Client,
    user_agent: String,
}

impl Crawler {
    pub fn new(fetcher: Arc<Fetcher>, limiters: Arc<HostLimiters>, robots: Arc<RobotsCache>) -> Self {
        Self {
            fetcher,
            limiters,
            robots,
            robots_client: reqwest::Client::new(),
            user_agent: "RagCoreBot/1.0".to_string(),
        }
    }

    pub async fn crawl(
        &self,
        start_url: &str,
        options: &CrawlOptions,
        sink: &dyn CrawlSink,
        cancel: &CancellationToken,
    ) -> CrawlResult<CrawlOutcome> {
        options.validate().map_err(CrawlError::Http)?;

        let base = url::Url::parse(start_url).map_err(|e| CrawlError::Security(e.into()))?;
        let origin = format!(
            "{}://{}",
            base.scheme(),
            base.host_str().ok_or(CrawlError::Security(crate::error::SecurityError::NoHost))?
        );

        if !options.ignore_robots {
            let robots = self.robots.get(&self.robots_client, &origin).await;
            if robots.disallows_all(&self.user_agent) {
                return Err(CrawlError::RobotsBlocked);
            }
        }

        sink.emit(CrawlProgress::starting(format!("starting crawl of {start_url}"))).await;

        let deadline = Instant::now() + options.max_total_time;
        let base_host = base.host_str().unwrap_or("").to_string();

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut total_bytes = 0usize;
        let mut partial = false;

        queue.push_back((start_url.to_string(), 0));
        visited.insert(normalize_key(start_url));

        while let Some((url, depth)) = queue.pop_front() {
            if cancel.is_cancelled() {
                sink.emit(CrawlProgress::cancelled()).await;
                partial = true;
                break;
            }
            if pages.len() as u32 >= options.max_pages {
                partial = true;
                break;
            }
            if Instant::now() >= deadline {
                warn!("crawl total-time budget exhausted");
                partial = true;
                break;
            }
            if total_bytes >= options.max_total_size {
                warn!("crawl total-size budget exhausted");
                partial = true;
                break;
            }

            let host = url::Url::parse(&url).ok().and_then(|u| u.host_str().map(String::from)).unwrap_or_default();
            if options.same_domain_only && host != base_host {
                continue;
            }
            if !matches_patterns(&url, options) {
                continue;
            }
            if !options.ignore_robots {
                let path = url::Url::parse(&url).map(|u| u.path().to_string()).unwrap_or_default();
                let robots = self.robots.get(&self.robots_client, &origin).await;
                if !robots.is_allowed(&self.user_agent, &path) {
                    continue;
                }
            }

            let _permit = self.limiters.acquire(&host).await;

            sink.emit(CrawlProgress::crawling(pages.len() as u32 + 1, options.max_pages, url.clone())).await;

            match self.fetcher.fetch(&url, options.timeout, options.max_page_size).await {
                Ok(fetched) => {
                    total_bytes += fetched.bytes.len();

                    match extract_html(&fetched.bytes, Some(&fetched.final_url)) {
                        Ok(extracted) => {
                            debug!(url = %url, len = extracted.text.len(), "page extracted");

                            if depth < options.max_depth {
                                for link in &extracted.outlinks {
                                    let key = normalize_key(link);
                                    if !visited.contains(&key) {
                                        visited.insert(key);
                                        queue.push_back((link.clone(), depth + 1));
                                    }
                                }
                            }

                            pages.push(CrawledPage {
                                url: fetched.final_url,
                                title: extracted.title,
                                content: extracted.text,
                            });
                        }
                        Err(e) => {
                            warn!(url = %url, error = %e, "failed to extract page, skipping");
                        }
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to fetch page, skipping");
                }
            }
        }

        if !queue.is_empty() {
            partial = true;
        }

        let total_content_length: usize = pages.iter().map(|p| p.content.len()).sum();
        let summary = format!(
            "crawled {} page(s) from {start_url}{}",
            pages.len(),
            if partial { " (partial: budget exhausted)" } else { "" }
        );

        info!(pages = pages.len(), partial, "crawl finished");

        sink.emit(CrawlProgress::processing(95, "post-processing crawled pages")).await;

        Ok(CrawlOutcome {
            base_url: start_url.to_string(),
            total_pages: pages.len() as u32,
            pages,
            total_content_length,
            summary,
            partial,
        })
    }
}

fn matches_patterns(url: &str, options: &CrawlOptions) -> bool {
    let path = url::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();

    if !options.include_patterns.is_empty() && !options.include_patterns.iter().any(|p| path.contains(p.as_str())) {
        return false;
    }
    if options.exclude_patterns.iter().any(|p| path.contains(p.as_str())) {
        return false;
    }
    true
}

/// Normalization key for the visited set: `http`/`https` variants of the
/// same host+path are equivalent, query params are order-independent.
fn normalize_key(raw: &str) -> String {
    let Ok(url) = url::Url::parse(raw) else {
        return raw.to_string();
    };
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    pairs.sort();
    let query = pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    format!("{}{}?{}", url.host_str().unwrap_or(""), url.path(), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_treats_http_and_https_as_equal() {
        assert_eq!(normalize_key("http://example.com/a"), normalize_key("https://example.com/a"));
    }

    #[test]
    fn normalize_key_is_query_order_independent() {
        assert_eq!(normalize_key("https://example.com/a?x=1&y=2"), normalize_key("https://example.com/a?y=2&x=1"));
    }

    #[test]
    fn matches_patterns_applies_include_and_exclude() {
        let mut options = CrawlOptions::default();
        options.include_patterns = vec!["/blog".to_string()];
        options.exclude_patterns = vec!["/admin".to_string()];
        assert!(matches_patterns("https://example.com/blog/post", &options));
        assert!(!matches_patterns("https://example.com/about", &options));
        assert!(!matches_patterns("https://example.com/blog/admin", &options));
    }
}
