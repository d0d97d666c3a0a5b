//! Run orchestration — wires discovery, selection, crawling, analysis, and
//! aggregation into a single audit run, emitting progress along the way.
//! Every stage failure short of a total score wipeout degrades; the run
//! aborts only when no module produced a usable score.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use sitepulse_common::{
    AggregateScore, AuditContext, AuditError, BusinessContext, PageFailure, ProgressSender,
    ProgressStep, SelectionSet,
};

use crate::aggregator;
use crate::config::{AuditConfig, ScoringConfig};
use crate::coordinator::{self, Coordinator, ModuleResults};
use crate::crawler::Crawler;
use crate::discovery::DiscoveryService;
use crate::selection::PageSelector;

/// Stats from one audit run.
#[derive(Debug, Default, Serialize)]
pub struct AuditStats {
    pub pages_discovered: u32,
    pub pages_selected: u32,
    pub pages_crawled: u32,
    pub pages_failed: u32,
    pub modules_run: u32,
    pub modules_failed: u32,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

impl std::fmt::Display for AuditStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Audit Run Complete ===")?;
        writeln!(f, "Pages discovered: {}", self.pages_discovered)?;
        writeln!(f, "Pages selected:   {}", self.pages_selected)?;
        writeln!(f, "Pages crawled:    {}", self.pages_crawled)?;
        writeln!(f, "Pages failed:     {}", self.pages_failed)?;
        writeln!(f, "Modules run:      {}", self.modules_run)?;
        writeln!(f, "Modules failed:   {}", self.modules_failed)?;
        writeln!(f, "Total cost:       ${:.4}", self.total_cost_usd)?;
        writeln!(f, "Duration:         {}ms", self.total_duration_ms)?;
        Ok(())
    }
}

/// Everything a run produces: the terminal score artifact, the raw module
/// results for the persistence collaborator, and the failure ledger.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub target_url: String,
    pub aggregate: AggregateScore,
    pub module_results: ModuleResults,
    pub failed_pages: Vec<PageFailure>,
    pub stats: AuditStats,
}

pub struct Auditor {
    discovery: DiscoveryService,
    selector: PageSelector,
    crawler: Crawler,
    coordinator: Coordinator,
    config: AuditConfig,
    scoring: ScoringConfig,
    progress: ProgressSender,
}

impl Auditor {
    pub fn new(
        discovery: DiscoveryService,
        selector: PageSelector,
        crawler: Crawler,
        coordinator: Coordinator,
        config: AuditConfig,
        scoring: ScoringConfig,
        progress: ProgressSender,
    ) -> Self {
        Self {
            discovery,
            selector,
            crawler,
            coordinator,
            config,
            scoring,
            progress,
        }
    }

    /// Run a full audit. Cancellation is cooperative: dropping this future
    /// abandons in-flight work and nothing is persisted.
    pub async fn run(&self, url: &str, business: BusinessContext) -> Result<AuditReport, AuditError> {
        let started = Instant::now();
        let target_url = normalize_target(url)?;

        let base_ctx = AuditContext {
            target_url: target_url.clone(),
            business,
            ..Default::default()
        };

        // 1. Discovery
        let discovery = self
            .discovery
            .discover(&target_url, self.config.discovery_timeout)
            .await;
        self.progress.emit(
            ProgressStep::Discovery,
            format!("Discovered {} pages", discovery.total_pages),
        );

        // 2. Selection — skipped entirely when discovery came up empty;
        // every module falls back to the homepage.
        let selection = if discovery.pages.is_empty() {
            warn!(url = %target_url, "Discovery found nothing, homepage-only run");
            SelectionSet::homepage_only(&target_url)
        } else {
            let selection = self
                .selector
                .select(&discovery.pages, &base_ctx, self.config.max_pages_per_module)
                .await;
            self.progress.emit(
                ProgressStep::Selection,
                format!("Selected {} unique pages", selection.unique_pages.len()),
            );
            selection
        };

        // 3. Crawl
        let (crawl_map, crawl_stats) = self
            .crawler
            .crawl(&selection.unique_pages, &target_url, &self.config)
            .await;
        self.progress.emit(
            ProgressStep::Crawl,
            format!(
                "Crawled {} pages ({} failed)",
                crawl_stats.pages_crawled, crawl_stats.pages_failed
            ),
        );

        // 4. Analysis over the shared, read-only crawl map
        let ctx = coordinator::enrich_context(&base_ctx, &discovery, &crawl_stats);
        let results = self.coordinator.analyze(&crawl_map, &selection, &ctx).await;
        let analysis_stats = coordinator::statistics(&results);
        self.progress.emit(
            ProgressStep::Analyze,
            format!(
                "{} modules run, {} failed",
                analysis_stats.modules_run, analysis_stats.modules_failed
            ),
        );

        // Crawl map (and its screenshots) is no longer needed.
        drop(crawl_map);

        // 5. Aggregation — wait-all already happened; fail only with zero
        // usable scores.
        let total_duration_ms = started.elapsed().as_millis() as u64;
        let aggregate = match aggregator::aggregate(&results, &ctx, &self.scoring, total_duration_ms)
        {
            Ok(aggregate) => aggregate,
            Err(e) => {
                self.progress
                    .emit(ProgressStep::Error, format!("Audit failed: {e}"));
                return Err(e);
            }
        };
        self.progress.emit(
            ProgressStep::Grade,
            format!("Overall {:.1}, grade {}", aggregate.overall, aggregate.grade),
        );
        self.progress
            .emit(ProgressStep::Critique, "Report handed off for critique");

        let stats = AuditStats {
            pages_discovered: discovery.total_pages as u32,
            pages_selected: selection.unique_pages.len() as u32,
            pages_crawled: crawl_stats.pages_crawled,
            pages_failed: crawl_stats.pages_failed,
            modules_run: analysis_stats.modules_run,
            modules_failed: analysis_stats.modules_failed,
            total_cost_usd: aggregate.total_cost_usd,
            total_duration_ms,
        };

        self.progress.emit(
            ProgressStep::Complete,
            format!("Audit complete in {total_duration_ms}ms"),
        );
        info!(url = %target_url, overall = aggregate.overall, grade = %aggregate.grade, "Audit run complete");

        Ok(AuditReport {
            target_url,
            aggregate,
            module_results: results,
            failed_pages: crawl_stats.failures,
            stats,
        })
    }
}

/// Validate and canonicalize the target URL; bare domains get https.
fn normalize_target(url: &str) -> Result<String, AuditError> {
    let candidate = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    };

    let parsed = Url::parse(&candidate).map_err(|e| AuditError::InvalidUrl(e.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(AuditError::InvalidUrl(format!("no host in {candidate}")));
    }
    Ok(parsed.to_string())
}
