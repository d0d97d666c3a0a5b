use serde::{Deserialize, Serialize};

use crate::Usage;

/// Closed set of supported provider families. Resolved once from the model
/// id when a client is constructed, never re-derived per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    Anthropic,
    OpenAi,
}

impl ProviderFamily {
    /// Map a model id to its provider family.
    pub fn for_model(model: &str) -> Option<Self> {
        if model.starts_with("claude") {
            Some(Self::Anthropic)
        } else if model.starts_with("gpt") || model.starts_with("o1") || model.starts_with("o3") {
            Some(Self::OpenAi)
        } else {
            None
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// USD per million input/output tokens, matched by model-id prefix.
/// First match wins, so more specific prefixes come first.
const PRICING: &[(&str, f64, f64)] = &[
    ("claude-haiku", 1.00, 5.00),
    ("claude-sonnet", 3.00, 15.00),
    ("claude-opus", 15.00, 75.00),
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1", 2.00, 8.00),
];

/// Compute the USD cost of a call from token usage. Unknown models cost
/// zero rather than erroring; cost metering is best-effort.
pub fn cost_usd(model: &str, usage: &Usage) -> f64 {
    for (prefix, input_per_m, output_per_m) in PRICING {
        if model.starts_with(prefix) {
            return usage.input_tokens as f64 / 1_000_000.0 * input_per_m
                + usage.output_tokens as f64 / 1_000_000.0 * output_per_m;
        }
    }
    0.0
}
