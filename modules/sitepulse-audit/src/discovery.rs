//! Page discovery — enumerates candidate pages for a site via sitemap.xml,
//! robots.txt-listed sitemaps, and a homepage navigation scan, in that
//! fixed order. Each source gets a slice of the total timeout; a source
//! failing is recorded but never blocks later sources, and `discover`
//! itself never errors.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use sitepulse_common::{url_filter, DiscoverySource, PageCandidate};

/// Cap on URLs taken from any single sitemap file.
const MAX_URLS_PER_SITEMAP: usize = 200;
/// Nested sitemaps followed from a sitemap index or robots.txt.
const MAX_CHILD_SITEMAPS: usize = 3;
/// Cap on links taken from the homepage nav scan.
const MAX_NAV_LINKS: usize = 30;

#[derive(Debug, Default, Serialize)]
pub struct DiscoveryResult {
    pub total_pages: usize,
    pub pages: Vec<PageCandidate>,
    /// Sources that contributed at least one page, in attempt order.
    pub sources: Vec<DiscoverySource>,
    /// Per-source failure messages; presence here is non-fatal.
    pub errors: HashMap<String, String>,
    pub discovery_time_ms: u64,
}

pub struct DiscoveryService {
    http: reqwest::Client,
}

impl DiscoveryService {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (compatible; SitePulseBot/1.0)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to build HTTP client");
        Self { http }
    }

    /// Enumerate candidate pages. Returns an empty `pages` list (never an
    /// error) when every source fails; the caller decides on a
    /// homepage-only fallback.
    pub async fn discover(&self, url: &str, timeout: Duration) -> DiscoveryResult {
        let started = Instant::now();
        let mut result = DiscoveryResult::default();

        let base = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                result.errors.insert("url".into(), format!("Invalid URL: {e}"));
                result.discovery_time_ms = started.elapsed().as_millis() as u64;
                return result;
            }
        };

        // Three sources, each bounded by its own slice of the budget.
        let slice = timeout / 3;
        let mut seen: Vec<String> = Vec::new();

        match tokio::time::timeout(slice, self.from_sitemap(&base)).await {
            Ok(Ok(urls)) if !urls.is_empty() => {
                self.collect(&mut result, &mut seen, &base, urls, DiscoverySource::Sitemap);
            }
            Ok(Ok(_)) => {
                result.errors.insert("sitemap".into(), "sitemap.xml empty or absent".into());
            }
            Ok(Err(e)) => {
                result.errors.insert("sitemap".into(), e.to_string());
            }
            Err(_) => {
                result.errors.insert("sitemap".into(), "sitemap fetch timed out".into());
            }
        }

        match tokio::time::timeout(slice, self.from_robots(&base)).await {
            Ok(Ok(urls)) if !urls.is_empty() => {
                self.collect(&mut result, &mut seen, &base, urls, DiscoverySource::RobotsSitemap);
            }
            Ok(Ok(_)) => {
                result
                    .errors
                    .insert("robots".into(), "no usable sitemaps in robots.txt".into());
            }
            Ok(Err(e)) => {
                result.errors.insert("robots".into(), e.to_string());
            }
            Err(_) => {
                result.errors.insert("robots".into(), "robots.txt fetch timed out".into());
            }
        }

        match tokio::time::timeout(slice, self.from_navigation(&base)).await {
            Ok(Ok(urls)) if !urls.is_empty() => {
                self.collect(&mut result, &mut seen, &base, urls, DiscoverySource::Navigation);
            }
            Ok(Ok(_)) => {
                result.errors.insert("navigation".into(), "no nav links found".into());
            }
            Ok(Err(e)) => {
                result.errors.insert("navigation".into(), e.to_string());
            }
            Err(_) => {
                result
                    .errors
                    .insert("navigation".into(), "homepage scan timed out".into());
            }
        }

        result.total_pages = result.pages.len();
        result.discovery_time_ms = started.elapsed().as_millis() as u64;
        info!(
            url,
            pages = result.total_pages,
            sources = result.sources.len(),
            failed_sources = result.errors.len(),
            "Discovery complete"
        );
        result
    }

    fn collect(
        &self,
        result: &mut DiscoveryResult,
        seen: &mut Vec<String>,
        base: &Url,
        urls: Vec<String>,
        source: DiscoverySource,
    ) {
        let mut added = 0usize;
        for url in urls {
            if !url_filter::is_crawlable(&url, base) {
                continue;
            }
            let normalized = url_filter::normalize_url(&url);
            if seen.contains(&normalized) {
                continue;
            }
            seen.push(normalized.clone());
            result.pages.push(PageCandidate {
                estimated_type: url_filter::estimate_page_type(&normalized),
                url: normalized,
                discovery_source: source,
            });
            added += 1;
        }
        if added > 0 {
            debug!(source = %source, added, "Discovery source contributed pages");
            result.sources.push(source);
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed for {url}"))?;
        if !resp.status().is_success() {
            anyhow::bail!("HTTP status {} for {url}", resp.status());
        }
        resp.text().await.context("Failed to read response body")
    }

    /// sitemap.xml, following a sitemap index one level down.
    async fn from_sitemap(&self, base: &Url) -> Result<Vec<String>> {
        let sitemap_url = base.join("/sitemap.xml")?.to_string();
        let body = self.fetch_text(&sitemap_url).await?;
        self.expand_sitemap(&body).await
    }

    /// Sitemaps referenced from robots.txt (skipping the default location
    /// already tried).
    async fn from_robots(&self, base: &Url) -> Result<Vec<String>> {
        let robots_url = base.join("/robots.txt")?.to_string();
        let body = self.fetch_text(&robots_url).await?;

        let default_sitemap = base.join("/sitemap.xml")?.to_string();
        let mut urls = Vec::new();
        let mut followed = 0usize;

        for line in body.lines() {
            let line = line.trim();
            // The value itself contains a colon (the scheme), so split once.
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            if !directive.trim().eq_ignore_ascii_case("sitemap") {
                continue;
            }
            let sitemap_url = value.trim();
            if sitemap_url.is_empty() || sitemap_url == default_sitemap {
                continue;
            }
            if followed >= MAX_CHILD_SITEMAPS {
                break;
            }
            followed += 1;
            match self.fetch_text(sitemap_url).await {
                Ok(body) => match self.expand_sitemap(&body).await {
                    Ok(mut found) => urls.append(&mut found),
                    Err(e) => warn!(sitemap_url, error = %e, "Failed to expand robots sitemap"),
                },
                Err(e) => warn!(sitemap_url, error = %e, "Failed to fetch robots sitemap"),
            }
        }

        Ok(urls)
    }

    /// Extract `<loc>` entries; if the document is a sitemap index, follow
    /// the child sitemaps one level.
    async fn expand_sitemap(&self, body: &str) -> Result<Vec<String>> {
        let locs = extract_locs(body);

        if !body.contains("<sitemapindex") {
            return Ok(locs.into_iter().take(MAX_URLS_PER_SITEMAP).collect());
        }

        let mut urls = Vec::new();
        for child in locs.iter().take(MAX_CHILD_SITEMAPS) {
            match self.fetch_text(child).await {
                Ok(child_body) => {
                    urls.extend(extract_locs(&child_body).into_iter().take(MAX_URLS_PER_SITEMAP));
                }
                Err(e) => warn!(child, error = %e, "Failed to fetch child sitemap"),
            }
        }
        Ok(urls)
    }

    /// Homepage fetch + href scan for nav links.
    async fn from_navigation(&self, base: &Url) -> Result<Vec<String>> {
        let html = self.fetch_text(base.as_str()).await?;
        Ok(extract_links(&html, base.as_str(), MAX_NAV_LINKS))
    }
}

impl Default for DiscoveryService {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull `<loc>` values out of sitemap XML.
fn extract_locs(xml: &str) -> Vec<String> {
    let loc_re = Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("valid regex");
    loc_re
        .captures_iter(xml)
        .map(|cap| cap[1].trim().to_string())
        .collect()
}

/// Extract hrefs from raw HTML, resolving relative URLs against `base_url`,
/// deduplicating, capped at `max` results.
pub fn extract_links(html: &str, base_url: &str, max: usize) -> Vec<String> {
    let href_re = Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex");
    let base = Url::parse(base_url).ok();

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for cap in href_re.captures_iter(html) {
        let raw = &cap[1];

        let resolved = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else if let Some(ref b) = base {
            match b.join(raw) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };

        if seen.insert(resolved.clone()) {
            links.push(resolved);
            if links.len() >= max {
                break;
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_locs_from_urlset() {
        let xml = r#"<?xml version="1.0"?>
            <urlset>
              <url><loc>https://example.com/</loc></url>
              <url><loc> https://example.com/about </loc></url>
            </urlset>"#;
        let locs = extract_locs(xml);
        assert_eq!(locs, vec!["https://example.com/", "https://example.com/about"]);
    }

    #[test]
    fn extracts_and_resolves_relative_links() {
        let html = r#"<nav><a href="/about">About</a>
            <a href="https://example.com/pricing">Pricing</a>
            <a href="/about">dup</a></nav>"#;
        let links = extract_links(html, "https://example.com/", 10);
        assert_eq!(
            links,
            vec!["https://example.com/about", "https://example.com/pricing"]
        );
    }

    #[test]
    fn link_cap_is_respected() {
        let html: String = (0..50)
            .map(|i| format!("<a href=\"/p{i}\">x</a>"))
            .collect();
        assert_eq!(extract_links(&html, "https://example.com/", 5).len(), 5);
    }

    #[tokio::test]
    async fn invalid_url_reports_error_without_panicking() {
        let service = DiscoveryService::new();
        let result = service.discover("not a url", Duration::from_secs(1)).await;
        assert!(result.pages.is_empty());
        assert!(result.errors.contains_key("url"));
    }
}
