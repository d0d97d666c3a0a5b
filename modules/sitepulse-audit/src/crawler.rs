//! Crawling service — fetches HTML and desktop/mobile screenshots for the
//! selected pages. Fetches are independent, bounded by a concurrency limit
//! and one overall wall-clock budget. Once the budget is spent, remaining
//! pages are marked failed and never retried; in-flight fetches are
//! cooperatively cancelled at the deadline.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use browserless_client::{BrowserlessClient, Viewport};
use sitepulse_common::{url_filter, CrawlErrorKind, CrawledPage, PageFailure, Screenshots};

use crate::config::AuditConfig;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
    fn name(&self) -> &str;
}

#[async_trait]
pub trait ScreenshotCapturer: Send + Sync {
    async fn capture(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Production impls
// ---------------------------------------------------------------------------

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; SitePulseBot/1.0)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP status {status} for {url}");
        }
        resp.text().await.context("Failed to read response body")
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Fetcher using Browserless `/content` for fully rendered HTML, for sites
/// whose markup is assembled client-side.
pub struct BrowserlessFetcher {
    client: BrowserlessClient,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: BrowserlessClient::new(base_url, token),
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.client
            .content(url)
            .await
            .context("Browserless content request failed")
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

pub struct BrowserlessCapturer {
    client: BrowserlessClient,
}

impl BrowserlessCapturer {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: BrowserlessClient::new(base_url, token),
        }
    }
}

#[async_trait]
impl ScreenshotCapturer for BrowserlessCapturer {
    async fn capture(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>> {
        self.client
            .screenshot(url, viewport)
            .await
            .context("Browserless screenshot request failed")
    }
}

/// Capturer for runs without a browser backend; every page simply carries
/// no screenshots, which no analyzer treats as fatal.
pub struct NoopCapturer;

#[async_trait]
impl ScreenshotCapturer for NoopCapturer {
    async fn capture(&self, _url: &str, _viewport: Viewport) -> Result<Vec<u8>> {
        anyhow::bail!("screenshot capture disabled")
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct CrawlStats {
    pub pages_attempted: u32,
    pub pages_crawled: u32,
    pub pages_failed: u32,
    pub failures: Vec<PageFailure>,
    pub budget_exhausted: bool,
    pub crawl_time_ms: u64,
}

enum PageOutcome {
    Crawled(CrawledPage),
    Failed(PageFailure),
}

pub struct Crawler {
    fetcher: Box<dyn PageFetcher>,
    capturer: Box<dyn ScreenshotCapturer>,
}

impl Crawler {
    pub fn new(fetcher: Box<dyn PageFetcher>, capturer: Box<dyn ScreenshotCapturer>) -> Self {
        Self { fetcher, capturer }
    }

    /// Crawl the selection's unique pages. Always returns; per-page
    /// failures are classified and recorded, never propagated.
    pub async fn crawl(
        &self,
        unique_pages: &[String],
        target_url: &str,
        config: &AuditConfig,
    ) -> (HashMap<String, CrawledPage>, CrawlStats) {
        let started = Instant::now();
        let deadline = started + config.max_crawl_time;
        let mut stats = CrawlStats::default();

        let batch: Vec<&String> = unique_pages.iter().take(config.max_total_pages).collect();
        stats.pages_attempted = batch.len() as u32;

        let outcomes: Vec<PageOutcome> = stream::iter(batch.into_iter().map(|url| {
            let url = url.clone();
            async move { self.crawl_one(url, target_url, deadline).await }
        }))
        .buffer_unordered(config.crawl_concurrency)
        .collect()
        .await;

        let mut crawl_map = HashMap::new();
        for outcome in outcomes {
            match outcome {
                PageOutcome::Crawled(page) => {
                    crawl_map.insert(url_filter::normalize_url(&page.url), page);
                    stats.pages_crawled += 1;
                }
                PageOutcome::Failed(failure) => {
                    if failure.message.starts_with("crawl budget exhausted") {
                        stats.budget_exhausted = true;
                    }
                    stats.pages_failed += 1;
                    stats.failures.push(failure);
                }
            }
        }

        stats.crawl_time_ms = started.elapsed().as_millis() as u64;
        info!(
            crawled = stats.pages_crawled,
            failed = stats.pages_failed,
            budget_exhausted = stats.budget_exhausted,
            elapsed_ms = stats.crawl_time_ms,
            "Crawl complete"
        );
        (crawl_map, stats)
    }

    async fn crawl_one(&self, url: String, target_url: &str, deadline: Instant) -> PageOutcome {
        let now = Instant::now();
        if now >= deadline {
            // Budget already spent before this page started; abandon it.
            return PageOutcome::Failed(PageFailure {
                url,
                error_type: CrawlErrorKind::Timeout,
                message: "crawl budget exhausted before fetch".to_string(),
            });
        }

        let fetch_started = Instant::now();
        let html = match tokio::time::timeout_at(deadline, self.fetcher.fetch(&url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                let message = format!("{e:#}");
                let error_type = CrawlErrorKind::classify(&message);
                warn!(url, error_type = %error_type, "Page fetch failed");
                return PageOutcome::Failed(PageFailure {
                    url,
                    error_type,
                    message,
                });
            }
            Err(_) => {
                warn!(url, "Crawl budget exhausted mid-fetch");
                return PageOutcome::Failed(PageFailure {
                    url,
                    error_type: CrawlErrorKind::Timeout,
                    message: "crawl budget exhausted during fetch".to_string(),
                });
            }
        };
        let load_time_ms = fetch_started.elapsed().as_millis() as u64;

        // Screenshots are best-effort per viewport; a missing one never
        // fails the page. Remaining budget still applies.
        let screenshots = Screenshots {
            desktop: self.capture_viewport(&url, Viewport::desktop(), deadline).await,
            mobile: self.capture_viewport(&url, Viewport::mobile(), deadline).await,
        };

        let depth = if url_filter::urls_match(&url, target_url) { 0 } else { 1 };
        PageOutcome::Crawled(CrawledPage {
            discovered_from: (depth > 0).then(|| target_url.to_string()),
            url,
            html,
            screenshots,
            load_time_ms,
            depth,
        })
    }

    async fn capture_viewport(
        &self,
        url: &str,
        viewport: Viewport,
        deadline: Instant,
    ) -> Option<Vec<u8>> {
        match tokio::time::timeout_at(deadline, self.capturer.capture(url, viewport)).await {
            Ok(Ok(bytes)) => Some(bytes),
            Ok(Err(e)) => {
                warn!(url, mobile = viewport.is_mobile, error = %e, "Screenshot capture failed");
                None
            }
            Err(_) => {
                warn!(url, mobile = viewport.is_mobile, "Screenshot skipped at crawl deadline");
                None
            }
        }
    }
}
