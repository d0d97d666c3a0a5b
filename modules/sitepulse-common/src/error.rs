//! Error taxonomy. Every layer converts failures into structured
//! partial-failure markers; only a run with zero usable module scores
//! escalates to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),

    #[error("No analyzer module produced a usable score: {0}")]
    NoUsableScores(String),
}

/// Sub-classification of a failed page fetch, matched against the
/// underlying error message in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlErrorKind {
    Antibot,
    Timeout,
    Ssl,
    Network,
    NotFound,
    Unknown,
}

impl CrawlErrorKind {
    /// Classify a fetch error message. Priority order matters: an antibot
    /// 403 often *also* mentions a timeout or TLS detail downstream.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();

        if msg.contains("403")
            || msg.contains("forbidden")
            || msg.contains("cloudflare")
            || msg.contains("captcha")
        {
            Self::Antibot
        } else if msg.contains("timeout") || msg.contains("timed out") {
            Self::Timeout
        } else if msg.contains("ssl") || msg.contains("certificate") || msg.contains("tls") {
            Self::Ssl
        } else if msg.contains("dns")
            || msg.contains("connection refused")
            || msg.contains("failed to lookup")
            || msg.contains("network")
        {
            Self::Network
        } else if msg.contains("404") || msg.contains("not found") {
            Self::NotFound
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Antibot => "antibot",
            Self::Timeout => "timeout",
            Self::Ssl => "ssl",
            Self::Network => "network",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CrawlErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page that failed during crawling, with its classification. Failed
/// pages are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub url: String,
    pub error_type: CrawlErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antibot_wins_over_timeout() {
        let kind = CrawlErrorKind::classify("403 Forbidden (cloudflare): request timed out");
        assert_eq!(kind, CrawlErrorKind::Antibot);
    }

    #[test]
    fn classification_priority_order() {
        assert_eq!(
            CrawlErrorKind::classify("operation timed out after 30s"),
            CrawlErrorKind::Timeout
        );
        assert_eq!(
            CrawlErrorKind::classify("invalid peer certificate"),
            CrawlErrorKind::Ssl
        );
        assert_eq!(
            CrawlErrorKind::classify("dns error: failed to lookup address"),
            CrawlErrorKind::Network
        );
        assert_eq!(
            CrawlErrorKind::classify("HTTP status 404"),
            CrawlErrorKind::NotFound
        );
        assert_eq!(
            CrawlErrorKind::classify("something else entirely"),
            CrawlErrorKind::Unknown
        );
    }
}
