//! AI-assisted page selection — picks up to N discovered pages per
//! analyzer module and unions them into one crawl set. A module whose
//! classifier call fails or returns nothing falls back to homepage-only.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ai_client::{parse_json_response, truncate_to_char_boundary, AiClient, AiRequest};
use sitepulse_common::{url_filter, AuditContext, CrawledPage, PageCandidate, SelectionSet};

/// The four selection targets. Desktop and mobile visual analysis share
/// the `Visual` pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerTarget {
    Seo,
    Content,
    Visual,
    Social,
}

impl AnalyzerTarget {
    pub const ALL: [AnalyzerTarget; 4] = [
        AnalyzerTarget::Seo,
        AnalyzerTarget::Content,
        AnalyzerTarget::Visual,
        AnalyzerTarget::Social,
    ];

    fn selection_brief(&self) -> &'static str {
        match self {
            Self::Seo => {
                "Pick pages for SEO analysis. Favor page-type diversity: homepage, \
                 a service or product page, a blog post, and other distinct templates."
            }
            Self::Content => {
                "Pick pages for messaging and content analysis. Favor pages with \
                 substantial copy: homepage, about, services, key landing pages."
            }
            Self::Visual => {
                "Pick pages for visual design review. Favor the templates a \
                 prospect sees first: homepage, services, contact."
            }
            Self::Social => {
                "Pick pages for social-proof analysis. Favor testimonial, review, \
                 case-study, and about-style pages where trust signals live."
            }
        }
    }
}

impl std::fmt::Display for AnalyzerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seo => write!(f, "seo"),
            Self::Content => write!(f, "content"),
            Self::Visual => write!(f, "visual"),
            Self::Social => write!(f, "social"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PageClassifier: Send + Sync {
    /// Rank and choose at most `max` candidate URLs suited to the target
    /// module. Returned URLs must come from `candidates`.
    async fn pick_pages(
        &self,
        target: AnalyzerTarget,
        candidates: &[PageCandidate],
        ctx: &AuditContext,
        max: usize,
    ) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// AI classifier
// ---------------------------------------------------------------------------

const SELECTION_SYSTEM_PROMPT: &str = "You are a website audit planner. Given a list of \
discovered pages on a business website, choose the pages most worth analyzing for a \
specific audit module. Only ever choose from the provided list; never invent URLs.";

/// What the model returns for a selection call.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct SelectionResponse {
    #[serde(default)]
    urls: Vec<String>,
}

pub struct AiPageClassifier {
    client: AiClient,
}

impl AiPageClassifier {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageClassifier for AiPageClassifier {
    async fn pick_pages(
        &self,
        target: AnalyzerTarget,
        candidates: &[PageCandidate],
        ctx: &AuditContext,
        max: usize,
    ) -> Result<Vec<String>> {
        let mut listing = String::new();
        for page in candidates {
            listing.push_str(&format!(
                "- {} (type: {:?}, found via: {})\n",
                page.url, page.estimated_type, page.discovery_source
            ));
        }
        let listing = truncate_to_char_boundary(&listing, 16_000);

        let industry = ctx
            .business
            .industry
            .as_deref()
            .unwrap_or("unknown industry");

        let schema = serde_json::to_string(&schemars::schema_for!(SelectionResponse))?;
        let user_prompt = format!(
            "{brief}\n\nThe business operates in: {industry}.\n\n\
             Discovered pages:\n{listing}\n\
             Choose at most {max} URLs. Respond with JSON matching this schema:\n{schema}",
            brief = target.selection_brief(),
        );

        let request = AiRequest::new(SELECTION_SYSTEM_PROMPT, user_prompt)
            .json()
            .max_tokens(1024);
        let response = self.client.chat(&request).await?;
        let parsed: SelectionResponse = parse_json_response(&response.content)?;

        // Selection must stay a subset of the discovered set.
        let picked: Vec<String> = parsed
            .urls
            .into_iter()
            .filter(|url| candidates.iter().any(|c| url_filter::urls_match(&c.url, url)))
            .take(max)
            .collect();

        Ok(picked)
    }
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

pub struct PageSelector {
    classifier: Box<dyn PageClassifier>,
}

impl PageSelector {
    pub fn new(classifier: Box<dyn PageClassifier>) -> Self {
        Self { classifier }
    }

    /// Run the classifier for all four targets and union the picks. Any
    /// target that fails or comes back empty degrades to homepage-only.
    pub async fn select(
        &self,
        discovered: &[PageCandidate],
        ctx: &AuditContext,
        max_pages_per_module: usize,
    ) -> SelectionSet {
        let homepage = ctx.target_url.clone();
        let mut picks: HashMap<&'static str, Vec<String>> = HashMap::new();

        for target in AnalyzerTarget::ALL {
            let urls = match self
                .classifier
                .pick_pages(target, discovered, ctx, max_pages_per_module)
                .await
            {
                Ok(urls) if !urls.is_empty() => urls,
                Ok(_) => {
                    warn!(target = %target, "Classifier returned no pages, falling back to homepage");
                    vec![homepage.clone()]
                }
                Err(e) => {
                    warn!(target = %target, error = %e, "Classifier failed, falling back to homepage");
                    vec![homepage.clone()]
                }
            };
            let key = match target {
                AnalyzerTarget::Seo => "seo",
                AnalyzerTarget::Content => "content",
                AnalyzerTarget::Visual => "visual",
                AnalyzerTarget::Social => "social",
            };
            picks.insert(key, urls);
        }

        let set = SelectionSet::new(
            picks.remove("seo").unwrap_or_default(),
            picks.remove("content").unwrap_or_default(),
            picks.remove("visual").unwrap_or_default(),
            picks.remove("social").unwrap_or_default(),
        );
        info!(
            unique_pages = set.unique_pages.len(),
            "Page selection complete"
        );
        set
    }
}

/// Match a module's selected URLs against crawl-map keys, tolerating
/// trailing-slash differences. Order follows the selection list.
pub fn filter_pages_for_analyzer<'a>(
    selected: &[String],
    crawl_map: &'a HashMap<String, CrawledPage>,
) -> Vec<&'a CrawledPage> {
    selected
        .iter()
        .filter_map(|url| {
            crawl_map
                .iter()
                .find(|(key, _)| url_filter::urls_match(key, url))
                .map(|(_, page)| page)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepulse_common::Screenshots;

    fn page(url: &str) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            html: String::new(),
            screenshots: Screenshots::default(),
            load_time_ms: 0,
            depth: 0,
            discovered_from: None,
        }
    }

    #[test]
    fn filter_is_trailing_slash_tolerant() {
        let mut crawl_map = HashMap::new();
        crawl_map.insert("https://example.com/about/".to_string(), page("https://example.com/about/"));

        let selected = vec!["https://example.com/about".to_string()];
        let matched = filter_pages_for_analyzer(&selected, &crawl_map);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].url, "https://example.com/about/");
    }

    #[test]
    fn filter_drops_uncrawled_selections() {
        let mut crawl_map = HashMap::new();
        crawl_map.insert("https://example.com/".to_string(), page("https://example.com/"));

        let selected = vec![
            "https://example.com/".to_string(),
            "https://example.com/missing".to_string(),
        ];
        assert_eq!(filter_pages_for_analyzer(&selected, &crawl_map).len(), 1);
    }
}
