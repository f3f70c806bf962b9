//! Page fetching with outcome classification.
//!
//! The crawler talks to the network through the [`PageFetcher`] trait:
//! - [`HttpFetcher`]: `reqwest` implementation used in production
//! - in-memory implementations in tests, so the crawl logic runs offline
//!
//! Fetching never fails past this boundary. Every transport problem (DNS,
//! refused connection, timeout, truncated body) becomes
//! [`FetchOutcome::NetworkError`], and there are no retries.

use crate::config::AuditConfig;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Classified result of a single GET.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 200 response with an HTML content type.
    Html { body: String, headers: HeaderMap },
    /// 200 response that is not HTML (PDF, image, JSON, …).
    NonHtml,
    /// Any status other than 200 once redirects are followed.
    HttpError(u16),
    /// DNS, connect, timeout or body read failure.
    NetworkError(String),
}

/// Source of pages for the crawler.
pub trait PageFetcher {
    /// GET a page and classify the outcome.
    async fn fetch(&self, url: &str) -> FetchOutcome;

    /// GET an auxiliary resource (robots.txt, sitemap.xml).
    ///
    /// Returns the body of a 200 response whatever its content type.
    async fn probe(&self, url: &str) -> Option<String>;
}

/// `reqwest`-backed fetcher with fixed headers and timeouts.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    probe_timeout: Duration,
}

impl HttpFetcher {
    /// Build a client sending the configured User-Agent and language headers.
    pub fn new(config: &AuditConfig) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            probe_timeout: config.probe_timeout(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let t0 = Instant::now();
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, timeout = e.is_timeout(), "Request failed");
                return FetchOutcome::NetworkError(e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "Non-200 response");
            return FetchOutcome::HttpError(status.as_u16());
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_lowercase().contains("text/html"));
        if !is_html {
            debug!("Skipping non-HTML content");
            return FetchOutcome::NonHtml;
        }

        let headers = response.headers().clone();
        match response.text().await {
            Ok(body) => {
                debug!(
                    bytes = body.len(),
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Fetched page"
                );
                FetchOutcome::Html { body, headers }
            }
            Err(e) => {
                debug!(error = %e, "Failed reading body");
                FetchOutcome::NetworkError(e.to_string())
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    async fn probe(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .ok()?;
        if response.status() != StatusCode::OK {
            debug!(status = response.status().as_u16(), "Probe missed");
            return None;
        }
        response.text().await.ok()
    }
}
