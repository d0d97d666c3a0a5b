//! Desktop and mobile visual analysis — vision calls on the screenshots
//! captured during crawling. One analyzer type covers both modules,
//! parameterized by viewport.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use ai_client::{parse_json_response, AiClient, AiRequest};
use sitepulse_common::{AuditContext, CrawledPage, ModuleName};

use super::{AssessmentResponse, Analyzer, ModuleReport};

/// Vision calls are the most expensive in the pipeline; cap them per module.
const MAX_VISION_CALLS: usize = 2;

const DESKTOP_SYSTEM_PROMPT: &str = "You are a web designer reviewing desktop screenshots of \
a business website. Assess visual hierarchy, layout, whitespace, typography, color use, \
imagery quality, above-the-fold impact, and whether the design looks current or dated. \
Score 0-100 where 100 is a polished, modern design. Report concrete issues with severity \
(critical, high, medium, low) and quick wins achievable with CSS-level changes.";

const MOBILE_SYSTEM_PROMPT: &str = "You are a web designer reviewing mobile screenshots of a \
business website. Assess mobile layout integrity, tap-target size, text legibility without \
zooming, horizontal overflow, menu usability, and above-the-fold impact on a phone. Score \
0-100 where 100 is a flawless mobile experience; overlapping or clipped content is critical. \
Report concrete issues with severity (critical, high, medium, low) and quick wins.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualViewport {
    Desktop,
    Mobile,
}

pub struct VisualAnalyzer {
    client: AiClient,
    viewport: VisualViewport,
}

impl VisualAnalyzer {
    pub fn desktop(client: AiClient) -> Self {
        Self {
            client,
            viewport: VisualViewport::Desktop,
        }
    }

    pub fn mobile(client: AiClient) -> Self {
        Self {
            client,
            viewport: VisualViewport::Mobile,
        }
    }

    fn screenshot_of<'a>(&self, page: &'a CrawledPage) -> Option<&'a Vec<u8>> {
        match self.viewport {
            VisualViewport::Desktop => page.screenshots.desktop.as_ref(),
            VisualViewport::Mobile => page.screenshots.mobile.as_ref(),
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self.viewport {
            VisualViewport::Desktop => DESKTOP_SYSTEM_PROMPT,
            VisualViewport::Mobile => MOBILE_SYSTEM_PROMPT,
        }
    }
}

#[async_trait]
impl Analyzer for VisualAnalyzer {
    fn module(&self) -> ModuleName {
        match self.viewport {
            VisualViewport::Desktop => ModuleName::DesktopVisual,
            VisualViewport::Mobile => ModuleName::MobileVisual,
        }
    }

    async fn analyze(&self, pages: &[&CrawledPage], ctx: &AuditContext) -> Result<ModuleReport> {
        let with_screenshots: Vec<(&CrawledPage, &Vec<u8>)> = pages
            .iter()
            .filter_map(|page| self.screenshot_of(page).map(|shot| (*page, shot)))
            .take(MAX_VISION_CALLS)
            .collect();

        if with_screenshots.is_empty() {
            anyhow::bail!("no {} screenshots captured", self.module());
        }

        let schema = serde_json::to_string(&schemars::schema_for!(AssessmentResponse))?;
        let industry = ctx
            .business
            .industry
            .as_deref()
            .unwrap_or("unknown industry");

        let mut total_score = 0.0;
        let mut issues = Vec::new();
        let mut quick_wins = Vec::new();
        let mut cost_usd = 0.0;

        for (page, screenshot) in &with_screenshots {
            let user_prompt = format!(
                "Business industry: {industry}. Screenshot of {url}.\n\
                 Respond with JSON matching this schema:\n{schema}",
                url = page.url,
            );
            let request = AiRequest::new(self.system_prompt(), user_prompt)
                .image((*screenshot).clone(), "image/png")
                .json();
            let response = self.client.chat(&request).await?;
            cost_usd += response.cost_usd;

            let parsed: AssessmentResponse = parse_json_response(&response.content)?;
            let (score, mut page_issues, mut page_wins) =
                parsed.into_parts(self.module().as_str());

            debug!(module = %self.module(), url = %page.url, score, "Visual assessment complete");
            total_score += score;
            for issue in &mut page_issues {
                issue.page_url.get_or_insert_with(|| page.url.clone());
            }
            issues.append(&mut page_issues);
            quick_wins.append(&mut page_wins);
        }

        Ok(ModuleReport {
            score: (total_score / with_screenshots.len() as f64).clamp(0.0, 100.0),
            issues,
            quick_wins,
            cost_usd,
            pages_analyzed: with_screenshots.len() as u32,
        })
    }
}
