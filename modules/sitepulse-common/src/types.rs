//! Core data model shared across the audit pipeline.

use serde::{Deserialize, Serialize};

use crate::url_filter;

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Rough page category estimated from the URL path, before any fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    About,
    Services,
    Products,
    Pricing,
    Contact,
    Blog,
    Testimonials,
    Portfolio,
    Legal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    Sitemap,
    RobotsSitemap,
    Navigation,
    Homepage,
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sitemap => write!(f, "sitemap"),
            Self::RobotsSitemap => write!(f, "robots_sitemap"),
            Self::Navigation => write!(f, "navigation"),
            Self::Homepage => write!(f, "homepage"),
        }
    }
}

/// A discovered, unfetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCandidate {
    pub url: String,
    pub estimated_type: PageType,
    pub discovery_source: DiscoverySource,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Per-module URL picks plus their union. Selection URLs are always a
/// subset of the discovered set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSet {
    pub seo: Vec<String>,
    pub content: Vec<String>,
    pub visual: Vec<String>,
    pub social: Vec<String>,
    pub unique_pages: Vec<String>,
}

impl SelectionSet {
    pub fn new(
        seo: Vec<String>,
        content: Vec<String>,
        visual: Vec<String>,
        social: Vec<String>,
    ) -> Self {
        let mut unique_pages: Vec<String> = Vec::new();
        for url in seo.iter().chain(&content).chain(&visual).chain(&social) {
            let normalized = url_filter::normalize_url(url);
            if !unique_pages.contains(&normalized) {
                unique_pages.push(normalized);
            }
        }
        Self {
            seo,
            content,
            visual,
            social,
            unique_pages,
        }
    }

    /// Fallback when every classifier call failed: all modules get the homepage.
    pub fn homepage_only(url: &str) -> Self {
        let single = vec![url.to_string()];
        Self::new(single.clone(), single.clone(), single.clone(), single)
    }
}

// ---------------------------------------------------------------------------
// Crawling
// ---------------------------------------------------------------------------

/// Captured screenshots for one page. A missing single viewport does not
/// fail the page.
#[derive(Debug, Clone, Default)]
pub struct Screenshots {
    pub desktop: Option<Vec<u8>>,
    pub mobile: Option<Vec<u8>>,
}

/// One fetched page. Read concurrently by every analyzer module, then
/// discarded; screenshots are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub html: String,
    #[serde(skip)]
    pub screenshots: Screenshots,
    pub load_time_ms: u64,
    pub depth: u32,
    pub discovered_from: Option<String>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// The closed set of analyzer modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleName {
    Seo,
    Content,
    DesktopVisual,
    MobileVisual,
    Social,
}

impl ModuleName {
    pub const ALL: [ModuleName; 5] = [
        ModuleName::Seo,
        ModuleName::Content,
        ModuleName::DesktopVisual,
        ModuleName::MobileVisual,
        ModuleName::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seo => "seo",
            Self::Content => "content",
            Self::DesktopVisual => "desktop_visual",
            Self::MobileVisual => "mobile_visual",
            Self::Social => "social",
        }
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub description: String,
    pub page_url: Option<String>,
}

/// A low-effort, high-impact fix surfaced by a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickWin {
    pub title: String,
    pub description: String,
}

/// Score and error are structurally mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ModuleOutcome {
    Scored { score: f64 },
    Failed { error: String },
}

/// Exactly one per module per run, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub module: ModuleName,
    #[serde(flatten)]
    pub outcome: ModuleOutcome,
    pub issues: Vec<Issue>,
    pub quick_wins: Vec<QuickWin>,
    pub cost_usd: f64,
    pub pages_analyzed: u32,
}

impl AnalyzerResult {
    pub fn failed(module: ModuleName, error: impl Into<String>) -> Self {
        Self {
            module,
            outcome: ModuleOutcome::Failed {
                error: error.into(),
            },
            issues: Vec::new(),
            quick_wins: Vec::new(),
            cost_usd: 0.0,
            pages_analyzed: 0,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match &self.outcome {
            ModuleOutcome::Scored { score } => Some(*score),
            ModuleOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ModuleOutcome::Scored { .. } => None,
            ModuleOutcome::Failed { error } => Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Caller-supplied business/ICP context for selection and analysis prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessContext {
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub icp_notes: Option<String>,
}

/// Context handed to every analyzer module. `enrich` produces a new value;
/// the caller's context is never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    pub target_url: String,
    pub business: BusinessContext,
    pub total_pages_discovered: Option<u32>,
    pub pages_crawled: Option<u32>,
    pub discovery_sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::D => write!(f, "D"),
            Self::F => write!(f, "F"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadTier {
    Hot,
    Warm,
    Cold,
}

/// Per-dimension contribution to the lead-priority score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub quality_gap: f64,
    pub budget_likelihood: f64,
    pub urgency: f64,
    pub industry_fit: f64,
    pub company_size: f64,
    pub engagement_potential: f64,
}

impl DimensionBreakdown {
    pub fn total(&self) -> f64 {
        self.quality_gap
            + self.budget_likelihood
            + self.urgency
            + self.industry_fit
            + self.company_size
            + self.engagement_potential
    }
}

/// 0-100 sales-readiness score, distinct from the website-quality grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadPriority {
    pub score: f64,
    pub tier: LeadTier,
    pub dimension_breakdown: DimensionBreakdown,
}

/// Weighted category scores; a category is absent when its module errored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub design: Option<f64>,
    pub seo: Option<f64>,
    pub content: Option<f64>,
    pub social: Option<f64>,
}

/// Terminal artifact of a run, handed to persistence/report collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateScore {
    pub overall: f64,
    pub per_category: CategoryScores,
    pub grade: Grade,
    pub quick_wins: Vec<QuickWin>,
    pub top_issue: Option<Issue>,
    pub lead_priority: LeadPriority,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_union_deduplicates_and_normalizes() {
        let set = SelectionSet::new(
            vec!["https://a.com/about".into()],
            vec!["https://a.com/about/".into()],
            vec!["https://a.com/".into()],
            vec![],
        );
        assert_eq!(set.unique_pages.len(), 2);
    }

    #[test]
    fn outcome_is_mutually_exclusive() {
        let failed = AnalyzerResult::failed(ModuleName::Seo, "boom");
        assert!(failed.score().is_none());
        assert_eq!(failed.error(), Some("boom"));
    }

    #[test]
    fn screenshots_never_serialized() {
        let page = CrawledPage {
            url: "https://a.com".into(),
            html: "<html></html>".into(),
            screenshots: Screenshots {
                desktop: Some(vec![1, 2, 3]),
                mobile: None,
            },
            load_time_ms: 10,
            depth: 0,
            discovered_from: None,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("screenshots"));
    }
}
