use anyhow::{anyhow, Result};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AiRequest, Usage, WireResponse};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub(crate) struct AnthropicClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

// =============================================================================
// Client
// =============================================================================

impl AnthropicClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, model: &str, request: &AiRequest) -> Result<WireResponse> {
        let url = format!("{}/messages", self.base_url);

        let mut content = Vec::new();
        if let Some(ref image) = request.image {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
            content.push(ContentBlock::Image {
                source: ImageSource {
                    source_type: "base64",
                    media_type: image.media_type.clone(),
                    data: encoded,
                },
            });
        }

        // Anthropic has no response_format switch; JSON mode is enforced by
        // instruction and fence-tolerant parsing on the caller's side.
        let user_text = if request.json_mode {
            format!(
                "{}\n\nRespond with a single JSON object and nothing else.",
                request.user_prompt
            )
        } else {
            request.user_prompt.clone()
        };
        content.push(ContentBlock::Text { text: user_text });

        let wire = ChatRequest {
            model: model.to_string(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: if request.system_prompt.is_empty() {
                None
            } else {
                Some(request.system_prompt.clone())
            },
            messages: vec![WireMessage {
                role: "user",
                content,
            }],
        };

        debug!(model, "Anthropic chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&wire)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Anthropic API error ({}): {}", status, error_text));
        }

        let parsed: ChatResponse = response.json().await?;

        let text = parsed
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(anyhow!("No text content in Anthropic response"));
        }

        Ok(WireResponse {
            content: text,
            usage: Usage {
                input_tokens: parsed.usage.input_tokens,
                output_tokens: parsed.usage.output_tokens,
            },
        })
    }
}
