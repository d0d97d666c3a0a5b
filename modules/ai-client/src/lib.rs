pub mod cache;
pub mod provider;
pub mod util;

mod anthropic;
mod openai;

pub use cache::{MemoryCache, NoopCache, ResponseCache};
pub use provider::ProviderFamily;
pub use util::{parse_json_response, strip_code_blocks, truncate_to_char_boundary};

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use anthropic::AnthropicClient;
use openai::OpenAiClient;

// =============================================================================
// Request / Response
// =============================================================================

/// An inline image passed to a vision-capable model.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// e.g. "image/png"
    pub media_type: String,
}

#[derive(Debug, Clone)]
pub struct AiRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub image: Option<ImageInput>,
    /// Ask the provider for a JSON object response. The content may still
    /// arrive wrapped in code fences; use [`parse_json_response`] on it.
    pub json_mode: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AiRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            image: None,
            json_mode: false,
            max_tokens: 4096,
            temperature: 0.0,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn image(mut self, bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        self.image = Some(ImageInput {
            bytes,
            media_type: media_type.into(),
        });
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub content: String,
    pub usage: Usage,
    pub cost_usd: f64,
}

// =============================================================================
// Client
// =============================================================================

/// Chat client for a single model. The provider family is resolved once at
/// construction from the model id; requests never re-derive it.
#[derive(Clone)]
pub struct AiClient {
    model: String,
    provider: ProviderFamily,
    backend: Backend,
    cache: Arc<dyn ResponseCache>,
}

#[derive(Clone)]
enum Backend {
    Anthropic(AnthropicClient),
    OpenAi(OpenAiClient),
}

impl AiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let provider = ProviderFamily::for_model(&model)
            .ok_or_else(|| anyhow!("Unknown provider for model: {model}"))?;
        let api_key = api_key.into();

        let backend = match provider {
            ProviderFamily::Anthropic => Backend::Anthropic(AnthropicClient::new(&api_key)),
            ProviderFamily::OpenAi => Backend::OpenAi(OpenAiClient::new(&api_key)),
        };

        Ok(Self {
            model,
            provider,
            backend,
            cache: Arc::new(NoopCache),
        })
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let provider = ProviderFamily::for_model(&model)
            .ok_or_else(|| anyhow!("Unknown provider for model: {model}"))?;
        let api_key = std::env::var(provider.api_key_var())
            .map_err(|_| anyhow!("{} environment variable not set", provider.api_key_var()))?;
        Self::new(api_key, model)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.backend = match self.backend {
            Backend::Anthropic(c) => Backend::Anthropic(c.with_base_url(&url)),
            Backend::OpenAi(c) => Backend::OpenAi(c.with_base_url(&url)),
        };
        self
    }

    /// Install a response cache. The default is a no-op.
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> ProviderFamily {
        self.provider
    }

    /// Send a chat request and return the text response with usage and cost.
    pub async fn chat(&self, request: &AiRequest) -> Result<AiResponse> {
        // Image requests are never cached; screenshots vary per run.
        let cache_key = if request.image.is_none() {
            Some(cache::request_key(&self.model, request))
        } else {
            None
        };

        if let Some(ref key) = cache_key {
            if let Some(cached) = self.cache.get(key).await {
                if let Ok(response) = serde_json::from_str::<AiResponse>(&cached) {
                    debug!(model = %self.model, "AI response served from cache");
                    return Ok(response);
                }
            }
        }

        let response = match &self.backend {
            Backend::Anthropic(client) => client.chat(&self.model, request).await?,
            Backend::OpenAi(client) => client.chat(&self.model, request).await?,
        };

        let cost_usd = provider::cost_usd(&self.model, &response.usage);
        let response = AiResponse {
            content: response.content,
            usage: response.usage,
            cost_usd,
        };

        if let Some(key) = cache_key {
            if let Ok(serialized) = serde_json::to_string(&response) {
                self.cache.put(&key, serialized).await;
            }
        }

        Ok(response)
    }
}

/// Raw response before cost attribution.
pub(crate) struct WireResponse {
    pub content: String,
    pub usage: Usage,
}
