//! Integration tests for the audit pipeline: selection through
//! aggregation, with stub fetchers/classifiers/analyzers in place of the
//! network and model backends.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use browserless_client::Viewport;
use sitepulse_audit::aggregator;
use sitepulse_audit::analyzers::{Analyzer, ModuleReport};
use sitepulse_audit::config::{AuditConfig, ScoringConfig};
use sitepulse_audit::coordinator::{self, Coordinator};
use sitepulse_audit::crawler::{Crawler, PageFetcher, ScreenshotCapturer};
use sitepulse_audit::discovery::DiscoveryResult;
use sitepulse_audit::selection::{AnalyzerTarget, PageClassifier, PageSelector};
use sitepulse_common::{
    url_filter, AuditContext, CrawledPage, DiscoverySource, Grade, ModuleName, PageCandidate,
};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Fetcher serving canned HTML; URLs listed in `slow` sleep past any
/// reasonable crawl budget.
struct StubFetcher {
    slow: Vec<String>,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if self.slow.iter().any(|s| s == url) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(format!("<html><head><title>{url}</title></head><body>ok</body></html>"))
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Capturer returning a tiny fixed payload for every viewport.
struct StubCapturer;

#[async_trait]
impl ScreenshotCapturer for StubCapturer {
    async fn capture(&self, _url: &str, _viewport: Viewport) -> Result<Vec<u8>> {
        Ok(vec![0u8; 16])
    }
}

/// Classifier that deterministically picks the first N candidates per
/// target, offset so the union exceeds any single module's picks.
struct StubClassifier;

#[async_trait]
impl PageClassifier for StubClassifier {
    async fn pick_pages(
        &self,
        target: AnalyzerTarget,
        candidates: &[PageCandidate],
        _ctx: &AuditContext,
        max: usize,
    ) -> Result<Vec<String>> {
        let offset = match target {
            AnalyzerTarget::Seo => 0,
            AnalyzerTarget::Content => 2,
            AnalyzerTarget::Visual => 4,
            AnalyzerTarget::Social => 5,
        };
        Ok(candidates
            .iter()
            .skip(offset)
            .take(max)
            .map(|c| c.url.clone())
            .collect())
    }
}

/// Classifier that always fails, to exercise homepage fallback.
struct BrokenClassifier;

#[async_trait]
impl PageClassifier for BrokenClassifier {
    async fn pick_pages(
        &self,
        _target: AnalyzerTarget,
        _candidates: &[PageCandidate],
        _ctx: &AuditContext,
        _max: usize,
    ) -> Result<Vec<String>> {
        anyhow::bail!("classifier unavailable")
    }
}

/// Analyzer returning a fixed score; records how many pages it saw.
struct FixedAnalyzer {
    module: ModuleName,
    score: f64,
}

#[async_trait]
impl Analyzer for FixedAnalyzer {
    fn module(&self) -> ModuleName {
        self.module
    }

    async fn analyze(&self, pages: &[&CrawledPage], _ctx: &AuditContext) -> Result<ModuleReport> {
        if pages.is_empty() {
            anyhow::bail!("no crawled pages assigned to {}", self.module);
        }
        Ok(ModuleReport {
            score: self.score,
            issues: vec![],
            quick_wins: vec![],
            cost_usd: 0.01,
            pages_analyzed: pages.len() as u32,
        })
    }
}

fn fixed_coordinator(seo: f64, content: f64, dv: f64, mv: f64, social: f64) -> Coordinator {
    Coordinator::new(
        Box::new(FixedAnalyzer { module: ModuleName::Seo, score: seo }),
        Box::new(FixedAnalyzer { module: ModuleName::Content, score: content }),
        Box::new(FixedAnalyzer { module: ModuleName::DesktopVisual, score: dv }),
        Box::new(FixedAnalyzer { module: ModuleName::MobileVisual, score: mv }),
        Box::new(FixedAnalyzer { module: ModuleName::Social, score: social }),
    )
}

fn discovered(n_sitemap: usize, n_nav: usize) -> DiscoveryResult {
    let mut pages = Vec::new();
    for i in 0..n_sitemap {
        pages.push(PageCandidate {
            url: format!("https://example.com/page-{i}"),
            estimated_type: url_filter::estimate_page_type(&format!("https://example.com/page-{i}")),
            discovery_source: DiscoverySource::Sitemap,
        });
    }
    for i in 0..n_nav {
        pages.push(PageCandidate {
            url: format!("https://example.com/nav-{i}"),
            estimated_type: url_filter::estimate_page_type(&format!("https://example.com/nav-{i}")),
            discovery_source: DiscoverySource::Navigation,
        });
    }
    DiscoveryResult {
        total_pages: pages.len(),
        pages,
        sources: vec![DiscoverySource::Sitemap, DiscoverySource::Navigation],
        errors: HashMap::new(),
        discovery_time_ms: 5,
    }
}

fn ctx() -> AuditContext {
    AuditContext {
        target_url: "https://example.com/".to_string(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// End-to-end: selection → crawl → analyze → aggregate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_pipeline_produces_expected_grade() {
    // Discovery: 45 pages (40 sitemap + 5 nav)
    let discovery = discovered(40, 5);
    assert_eq!(discovery.total_pages, 45);

    // Selection: offset picks of 5 per module union to 10 unique pages
    let selector = PageSelector::new(Box::new(StubClassifier));
    let selection = selector.select(&discovery.pages, &ctx(), 5).await;
    assert_eq!(selection.seo.len(), 5);
    assert_eq!(selection.unique_pages.len(), 10);
    for url in &selection.unique_pages {
        assert!(discovery.pages.iter().any(|p| url_filter::urls_match(&p.url, url)));
    }

    // Crawl: all 10 succeed
    let crawler = Crawler::new(
        Box::new(StubFetcher { slow: vec![] }),
        Box::new(StubCapturer),
    );
    let (crawl_map, crawl_stats) = crawler
        .crawl(&selection.unique_pages, "https://example.com/", &AuditConfig::default())
        .await;
    assert_eq!(crawl_map.len(), 10);
    assert_eq!(crawl_stats.pages_failed, 0);

    // Analysis: all five modules succeed with fixed scores
    let coordinator = fixed_coordinator(82.0, 76.0, 80.0, 70.0, 60.0);
    let enriched = coordinator::enrich_context(&ctx(), &discovery, &crawl_stats);
    let results = coordinator.analyze(&crawl_map, &selection, &enriched).await;

    let stats = coordinator::statistics(&results);
    assert_eq!(stats.modules_run, 5);
    assert_eq!(stats.modules_failed, 0);

    // Aggregation: design = avg(80, 70) = 75; weighted overall
    // 75*.3 + 82*.3 + 76*.2 + 60*.2 = 74.3 → grade B
    let aggregate =
        aggregator::aggregate(&results, &enriched, &ScoringConfig::default(), 1234).unwrap();
    assert_eq!(aggregate.per_category.design, Some(75.0));
    assert!((aggregate.overall - 74.3).abs() < 1e-9);
    assert_eq!(aggregate.grade, Grade::B);
    assert_eq!(aggregate.total_duration_ms, 1234);
    assert!(aggregate.total_cost_usd > 0.0);
}

// ---------------------------------------------------------------------------
// Crawl budget exhaustion
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn crawl_budget_exhaustion_degrades_not_fails() {
    let urls: Vec<String> = (0..10).map(|i| format!("https://example.com/p{i}")).collect();
    // 4 of the 10 pages hang past the budget
    let slow: Vec<String> = urls[6..].to_vec();

    let crawler = Crawler::new(
        Box::new(StubFetcher { slow }),
        Box::new(StubCapturer),
    );
    let config = AuditConfig {
        max_crawl_time: Duration::from_millis(200),
        crawl_concurrency: 10,
        ..Default::default()
    };
    let (crawl_map, stats) = crawler.crawl(&urls, "https://example.com/", &config).await;

    assert_eq!(crawl_map.len(), 6);
    assert_eq!(stats.pages_failed, 4);
    assert!(stats.budget_exhausted);
    for failure in &stats.failures {
        assert_eq!(failure.error_type, sitepulse_common::CrawlErrorKind::Timeout);
    }

    // Analysis proceeds over the 6 survivors without error.
    let selection = sitepulse_common::SelectionSet::new(
        urls[..6].to_vec(),
        urls[..6].to_vec(),
        urls[..6].to_vec(),
        urls[..6].to_vec(),
    );
    let coordinator = fixed_coordinator(80.0, 80.0, 80.0, 80.0, 80.0);
    let results = coordinator.analyze(&crawl_map, &selection, &ctx()).await;
    assert_eq!(coordinator::statistics(&results).modules_failed, 0);
    assert_eq!(results.seo.pages_analyzed, 6);
}

// ---------------------------------------------------------------------------
// Fallbacks and fail-soft behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broken_classifier_falls_back_to_homepage() {
    let discovery = discovered(10, 0);
    let selector = PageSelector::new(Box::new(BrokenClassifier));
    let selection = selector.select(&discovery.pages, &ctx(), 5).await;

    assert_eq!(selection.seo, vec!["https://example.com/".to_string()]);
    assert_eq!(selection.unique_pages, vec!["https://example.com/".to_string()]);
}

#[tokio::test]
async fn failed_module_does_not_fail_coordinator() {
    struct BrokenAnalyzer(ModuleName);

    #[async_trait]
    impl Analyzer for BrokenAnalyzer {
        fn module(&self) -> ModuleName {
            self.0
        }
        async fn analyze(
            &self,
            _pages: &[&CrawledPage],
            _ctx: &AuditContext,
        ) -> Result<ModuleReport> {
            anyhow::bail!("model returned malformed JSON")
        }
    }

    let coordinator = Coordinator::new(
        Box::new(FixedAnalyzer { module: ModuleName::Seo, score: 90.0 }),
        Box::new(BrokenAnalyzer(ModuleName::Content)),
        Box::new(FixedAnalyzer { module: ModuleName::DesktopVisual, score: 70.0 }),
        Box::new(BrokenAnalyzer(ModuleName::MobileVisual)),
        Box::new(FixedAnalyzer { module: ModuleName::Social, score: 50.0 }),
    );

    let crawler = Crawler::new(
        Box::new(StubFetcher { slow: vec![] }),
        Box::new(StubCapturer),
    );
    let urls = vec!["https://example.com/".to_string()];
    let (crawl_map, _) = crawler
        .crawl(&urls, "https://example.com/", &AuditConfig::default())
        .await;
    let selection = sitepulse_common::SelectionSet::new(
        urls.clone(),
        urls.clone(),
        urls.clone(),
        urls,
    );

    let results = coordinator.analyze(&crawl_map, &selection, &ctx()).await;
    let stats = coordinator::statistics(&results);
    assert_eq!(stats.modules_failed, 2);
    assert_eq!(stats.average_score, Some((90.0 + 70.0 + 50.0) / 3.0));
    assert!(results.content.error().is_some());

    // Aggregation still succeeds over the survivors.
    let aggregate =
        aggregator::aggregate(&results, &ctx(), &ScoringConfig::default(), 10).unwrap();
    assert!(aggregate.overall > 0.0);
    // Content weight redistributed: (70*30 + 90*30 + 50*20) / 80 = 72.5
    assert!((aggregate.overall - 72.5).abs() < 1e-9);
}
