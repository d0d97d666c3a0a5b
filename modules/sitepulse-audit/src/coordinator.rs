//! Analysis coordinator — runs the five analyzer modules concurrently over
//! the shared, read-only crawl map. A module failure degrades to a failed
//! result; the coordinator itself never fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ai_client::AiClient;
use sitepulse_common::{AnalyzerResult, AuditContext, CrawledPage, ModuleName, ModuleOutcome, SelectionSet};

use crate::analyzers::{
    Analyzer, ContentAnalyzer, SeoAnalyzer, SocialAnalyzer, VisualAnalyzer,
};
use crate::crawler::CrawlStats;
use crate::discovery::DiscoveryResult;
use crate::selection::filter_pages_for_analyzer;

/// One result per module, as a closed record rather than a keyed map, so
/// aggregation is compile-time complete over the module set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleResults {
    pub seo: AnalyzerResult,
    pub content: AnalyzerResult,
    pub desktop_visual: AnalyzerResult,
    pub mobile_visual: AnalyzerResult,
    pub social: AnalyzerResult,
}

impl ModuleResults {
    /// Results in fixed module order (quick wins concatenate in this order).
    pub fn iter(&self) -> impl Iterator<Item = &AnalyzerResult> {
        [
            &self.seo,
            &self.content,
            &self.desktop_visual,
            &self.mobile_visual,
            &self.social,
        ]
        .into_iter()
    }

    pub fn total_cost_usd(&self) -> f64 {
        self.iter().map(|r| r.cost_usd).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisStatistics {
    pub modules_run: u32,
    pub modules_failed: u32,
    pub average_score: Option<f64>,
}

/// Merge discovery/crawl metadata into a new context for the modules. The
/// caller's context is never mutated.
pub fn enrich_context(
    base: &AuditContext,
    discovery: &DiscoveryResult,
    crawl: &CrawlStats,
) -> AuditContext {
    let mut enriched = base.clone();
    enriched.total_pages_discovered = Some(discovery.total_pages as u32);
    enriched.pages_crawled = Some(crawl.pages_crawled);
    enriched.discovery_sources = discovery.sources.iter().map(|s| s.to_string()).collect();
    enriched
}

/// Run statistics over a finished module set. `average_score` covers only
/// modules that produced a score.
pub fn statistics(results: &ModuleResults) -> AnalysisStatistics {
    let scores: Vec<f64> = results.iter().filter_map(|r| r.score()).collect();
    let modules_failed = results.iter().filter(|r| r.error().is_some()).count() as u32;

    AnalysisStatistics {
        modules_run: results.iter().count() as u32,
        modules_failed,
        average_score: if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        },
    }
}

pub struct Coordinator {
    seo: Box<dyn Analyzer>,
    content: Box<dyn Analyzer>,
    desktop_visual: Box<dyn Analyzer>,
    mobile_visual: Box<dyn Analyzer>,
    social: Box<dyn Analyzer>,
}

impl Coordinator {
    pub fn new(
        seo: Box<dyn Analyzer>,
        content: Box<dyn Analyzer>,
        desktop_visual: Box<dyn Analyzer>,
        mobile_visual: Box<dyn Analyzer>,
        social: Box<dyn Analyzer>,
    ) -> Self {
        Self {
            seo,
            content,
            desktop_visual,
            mobile_visual,
            social,
        }
    }

    /// Default AI-backed module set sharing one client.
    pub fn with_ai(client: AiClient) -> Self {
        Self::new(
            Box::new(SeoAnalyzer::new(client.clone())),
            Box::new(ContentAnalyzer::new(client.clone())),
            Box::new(VisualAnalyzer::desktop(client.clone())),
            Box::new(VisualAnalyzer::mobile(client.clone())),
            Box::new(SocialAnalyzer::new(client)),
        )
    }

    /// Wait-all, fail-soft: every module finishes (scored or failed)
    /// before this returns.
    pub async fn analyze(
        &self,
        crawl_map: &HashMap<String, CrawledPage>,
        selection: &SelectionSet,
        ctx: &AuditContext,
    ) -> ModuleResults {
        let seo_pages = filter_pages_for_analyzer(&selection.seo, crawl_map);
        let content_pages = filter_pages_for_analyzer(&selection.content, crawl_map);
        let visual_pages = filter_pages_for_analyzer(&selection.visual, crawl_map);
        let social_pages = filter_pages_for_analyzer(&selection.social, crawl_map);

        let (seo, content, desktop_visual, mobile_visual, social) = tokio::join!(
            run_module(self.seo.as_ref(), &seo_pages, ctx),
            run_module(self.content.as_ref(), &content_pages, ctx),
            run_module(self.desktop_visual.as_ref(), &visual_pages, ctx),
            run_module(self.mobile_visual.as_ref(), &visual_pages, ctx),
            run_module(self.social.as_ref(), &social_pages, ctx),
        );

        let results = ModuleResults {
            seo,
            content,
            desktop_visual,
            mobile_visual,
            social,
        };
        let stats = statistics(&results);
        info!(
            modules_run = stats.modules_run,
            modules_failed = stats.modules_failed,
            average_score = stats.average_score,
            "Analysis complete"
        );
        results
    }
}

async fn run_module(
    analyzer: &dyn Analyzer,
    pages: &[&CrawledPage],
    ctx: &AuditContext,
) -> AnalyzerResult {
    let module = analyzer.module();
    match analyzer.analyze(pages, ctx).await {
        Ok(report) => AnalyzerResult {
            module,
            outcome: ModuleOutcome::Scored {
                score: report.score,
            },
            issues: report.issues,
            quick_wins: report.quick_wins,
            cost_usd: report.cost_usd,
            pages_analyzed: report.pages_analyzed,
        },
        Err(e) => {
            warn!(module = %module, error = %e, "Analyzer module failed");
            AnalyzerResult::failed(module, format!("{e:#}"))
        }
    }
}
