use anyhow::Result;
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

use ai_client::{truncate_to_char_boundary, AiClient};
use sitepulse_common::{AuditContext, CrawledPage, ModuleName};

use super::{assess_batched, Analyzer, ModuleReport};

/// Extracted-prose budget per page.
const CONTENT_BUDGET_BYTES: usize = 8_000;

const CONTENT_SYSTEM_PROMPT: &str = "You are a conversion copywriter auditing a business \
website. Assess the provided page content for: clarity of the value proposition, audience \
fit, calls to action, readability, staleness, and trust-building specifics (numbers, names, \
proof). Score 0-100 where 100 is compelling, current, and conversion-ready copy. Report \
concrete issues with severity (critical, high, medium, low) and quick wins the owner could \
fix by editing text alone.";

pub struct ContentAnalyzer {
    client: AiClient,
}

impl ContentAnalyzer {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }
}

/// Readability extraction: strip chrome, keep the main copy as markdown.
fn extract_main_content(page: &CrawledPage) -> String {
    let parsed_url = url::Url::parse(&page.url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: page.html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);
    if text.trim().is_empty() {
        // Readability can strike out on sparse pages; fall back to raw HTML.
        return truncate_to_char_boundary(&page.html, CONTENT_BUDGET_BYTES).to_string();
    }
    truncate_to_char_boundary(&text, CONTENT_BUDGET_BYTES).to_string()
}

#[async_trait]
impl Analyzer for ContentAnalyzer {
    fn module(&self) -> ModuleName {
        ModuleName::Content
    }

    async fn analyze(&self, pages: &[&CrawledPage], ctx: &AuditContext) -> Result<ModuleReport> {
        assess_batched(
            &self.client,
            self.module(),
            CONTENT_SYSTEM_PROMPT,
            pages,
            ctx,
            extract_main_content,
        )
        .await
    }
}
