//! The five analyzer modules. Each runs over its assigned slice of the
//! shared crawl map, batches pages into a bounded number of AI calls, and
//! returns a 0-100 score with issues and quick wins. A throwing module is
//! converted to a failed result by the coordinator, never by the module.

pub mod content;
pub mod seo;
pub mod social;
pub mod visual;

pub use content::ContentAnalyzer;
pub use seo::SeoAnalyzer;
pub use social::SocialAnalyzer;
pub use visual::{VisualAnalyzer, VisualViewport};

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ai_client::{parse_json_response, AiClient, AiRequest};
use sitepulse_common::{AuditContext, CrawledPage, Issue, ModuleName, QuickWin, Severity};

/// Pages folded into one AI call. With the default five pages per module
/// this caps a text module at two calls.
pub(crate) const PAGES_PER_CALL: usize = 3;

/// Successful module output, before the coordinator wraps it into an
/// `AnalyzerResult`.
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub score: f64,
    pub issues: Vec<Issue>,
    pub quick_wins: Vec<QuickWin>,
    pub cost_usd: f64,
    pub pages_analyzed: u32,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn module(&self) -> ModuleName;

    /// Analyze the module's pages. Errors are fine here; the coordinator
    /// degrades them to a failed result without failing the run.
    async fn analyze(&self, pages: &[&CrawledPage], ctx: &AuditContext) -> Result<ModuleReport>;
}

// ---------------------------------------------------------------------------
// Shared wire format
// ---------------------------------------------------------------------------

/// What every assessment call returns.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub(crate) struct AssessmentResponse {
    /// 0-100
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<WireIssue>,
    #[serde(default)]
    pub quick_wins: Vec<WireQuickWin>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub(crate) struct WireIssue {
    /// "critical", "high", "medium", or "low"
    pub severity: String,
    pub title: String,
    pub description: String,
    pub page_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub(crate) struct WireQuickWin {
    pub title: String,
    pub description: String,
}

pub(crate) fn parse_severity(raw: &str) -> Severity {
    match raw.to_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "low" => Severity::Low,
        _ => Severity::Medium,
    }
}

impl AssessmentResponse {
    pub(crate) fn into_parts(self, category: &str) -> (f64, Vec<Issue>, Vec<QuickWin>) {
        let issues = self
            .issues
            .into_iter()
            .map(|i| Issue {
                severity: parse_severity(&i.severity),
                category: category.to_string(),
                title: i.title,
                description: i.description,
                page_url: i.page_url,
            })
            .collect();
        let quick_wins = self
            .quick_wins
            .into_iter()
            .map(|w| QuickWin {
                title: w.title,
                description: w.description,
            })
            .collect();
        (self.score.clamp(0.0, 100.0), issues, quick_wins)
    }
}

// ---------------------------------------------------------------------------
// Batched text assessment shared by the seo/content/social modules
// ---------------------------------------------------------------------------

/// Run one JSON assessment call per batch of pages and merge the results.
/// Scores are averaged weighted by batch size; issues and quick wins are
/// concatenated in batch order.
pub(crate) async fn assess_batched(
    client: &AiClient,
    module: ModuleName,
    system_prompt: &str,
    pages: &[&CrawledPage],
    ctx: &AuditContext,
    render_page: impl Fn(&CrawledPage) -> String,
) -> Result<ModuleReport> {
    if pages.is_empty() {
        anyhow::bail!("no crawled pages assigned to {module}");
    }

    let industry = ctx
        .business
        .industry
        .as_deref()
        .unwrap_or("unknown industry");
    let schema = serde_json::to_string(&schemars::schema_for!(AssessmentResponse))?;

    let mut weighted_score = 0.0;
    let mut issues = Vec::new();
    let mut quick_wins = Vec::new();
    let mut cost_usd = 0.0;
    let mut pages_analyzed = 0u32;

    for batch in pages.chunks(PAGES_PER_CALL) {
        let mut body = String::new();
        for page in batch {
            body.push_str(&format!("\n## Page: {}\n\n{}\n", page.url, render_page(page)));
        }

        let user_prompt = format!(
            "Business industry: {industry}. Site under audit: {target}.\n\
             Assess the following {count} page(s).{body}\n\n\
             Respond with JSON matching this schema:\n{schema}",
            target = ctx.target_url,
            count = batch.len(),
        );

        let request = AiRequest::new(system_prompt, user_prompt).json();
        let response = client.chat(&request).await?;
        cost_usd += response.cost_usd;

        let parsed: AssessmentResponse = parse_json_response(&response.content)?;
        let (score, mut batch_issues, mut batch_wins) = parsed.into_parts(module.as_str());

        debug!(module = %module, batch = batch.len(), score, "Assessment batch complete");
        weighted_score += score * batch.len() as f64;
        pages_analyzed += batch.len() as u32;
        issues.append(&mut batch_issues);
        quick_wins.append(&mut batch_wins);
    }

    Ok(ModuleReport {
        score: (weighted_score / pages_analyzed as f64).clamp(0.0, 100.0),
        issues,
        quick_wins,
        cost_usd,
        pages_analyzed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parsing_defaults_to_medium() {
        assert_eq!(parse_severity("CRITICAL"), Severity::Critical);
        assert_eq!(parse_severity("high"), Severity::High);
        assert_eq!(parse_severity("low"), Severity::Low);
        assert_eq!(parse_severity("whatever"), Severity::Medium);
    }

    #[test]
    fn assessment_scores_are_clamped() {
        let response = AssessmentResponse {
            score: 140.0,
            issues: vec![],
            quick_wins: vec![],
        };
        let (score, _, _) = response.into_parts("seo");
        assert_eq!(score, 100.0);
    }
}
