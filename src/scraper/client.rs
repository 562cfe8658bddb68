//! Outbound HTTP for page fetches.

use std::future::Future;

use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::retry::{retry, RetryConfig};

/// Source of HTML documents by URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>>;
}

/// reqwest-backed fetcher with a browser-like header set.
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .context("Invalid accept_language header")?,
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            retry: RetryConfig::fetch(config.fetch_retries),
        })
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Bad status from {}", url))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        retry(&self.retry, url, || self.get_once(url)).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
        assert_eq!(fetcher.retry.max_retries, 0);
    }

    #[test]
    fn test_rejects_invalid_header() {
        let config = ScraperConfig {
            accept_language: "en\nfr".to_string(),
            ..Default::default()
        };
        assert!(HttpFetcher::new(&config).is_err());
    }
}
