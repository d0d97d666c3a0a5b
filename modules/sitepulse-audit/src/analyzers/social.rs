use anyhow::Result;
use async_trait::async_trait;

use ai_client::{truncate_to_char_boundary, AiClient};
use sitepulse_common::{AuditContext, CrawledPage, ModuleName};

use super::{assess_batched, Analyzer, ModuleReport};

const HTML_BUDGET_BYTES: usize = 10_000;

const SOCIAL_SYSTEM_PROMPT: &str = "You are auditing a business website's social proof and \
trust signals. Assess the provided pages' HTML for: links to active social profiles, \
testimonials and reviews (with names and specifics, not stock blurbs), case studies, \
certifications and badges, team photos, and third-party review embeds. Score 0-100 where \
100 means a visitor immediately sees credible, current social proof. Report concrete \
issues with severity (critical, high, medium, low) and quick wins such as surfacing \
existing reviews or linking profiles already in the footer.";

pub struct SocialAnalyzer {
    client: AiClient,
}

impl SocialAnalyzer {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for SocialAnalyzer {
    fn module(&self) -> ModuleName {
        ModuleName::Social
    }

    async fn analyze(&self, pages: &[&CrawledPage], ctx: &AuditContext) -> Result<ModuleReport> {
        assess_batched(&self.client, self.module(), SOCIAL_SYSTEM_PROMPT, pages, ctx, |page| {
            truncate_to_char_boundary(&page.html, HTML_BUDGET_BYTES).to_string()
        })
        .await
    }
}
