use anyhow::Result;
use async_trait::async_trait;

use ai_client::{truncate_to_char_boundary, AiClient};
use sitepulse_common::{AuditContext, CrawledPage, ModuleName};

use super::{assess_batched, Analyzer, ModuleReport};

/// Raw HTML budget per page. SEO assessment needs the real markup (head,
/// headings, alt attributes), not extracted prose.
const HTML_BUDGET_BYTES: usize = 12_000;

const SEO_SYSTEM_PROMPT: &str = "You are a technical SEO auditor reviewing a small-business \
website. Assess the provided pages' HTML for: title tags and meta descriptions (presence, \
length, uniqueness), heading hierarchy, image alt text, canonical tags, structured data, \
internal linking, and obvious indexability problems. Score 0-100 where 100 is flawless \
on-page SEO. Report concrete issues with severity (critical, high, medium, low) and quick \
wins a developer could ship in under an hour.";

pub struct SeoAnalyzer {
    client: AiClient,
}

impl SeoAnalyzer {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for SeoAnalyzer {
    fn module(&self) -> ModuleName {
        ModuleName::Seo
    }

    async fn analyze(&self, pages: &[&CrawledPage], ctx: &AuditContext) -> Result<ModuleReport> {
        assess_batched(&self.client, self.module(), SEO_SYSTEM_PROMPT, pages, ctx, |page| {
            truncate_to_char_boundary(&page.html, HTML_BUDGET_BYTES).to_string()
        })
        .await
    }
}
