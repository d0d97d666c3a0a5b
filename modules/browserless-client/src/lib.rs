pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

/// Browser viewport for screenshot capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub is_mobile: bool,
}

impl Viewport {
    pub fn desktop() -> Self {
        Self {
            width: 1440,
            height: 900,
            is_mobile: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            width: 390,
            height: 844,
            is_mobile: true,
        }
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let mut endpoint = format!("{}{}", self.base_url, path);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        let body = serde_json::json!({ "url": url });

        let resp = self
            .client
            .post(self.endpoint("/content"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }

    /// Capture a PNG screenshot of a URL at the given viewport via the
    /// Browserless /screenshot endpoint.
    pub async fn screenshot(&self, url: &str, viewport: Viewport) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "url": url,
            "options": { "type": "png", "fullPage": false },
            "viewport": {
                "width": viewport.width,
                "height": viewport.height,
                "isMobile": viewport.is_mobile,
            },
        });

        let resp = self
            .client
            .post(self.endpoint("/screenshot"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_presets() {
        assert!(!Viewport::desktop().is_mobile);
        assert!(Viewport::mobile().is_mobile);
        assert!(Viewport::desktop().width > Viewport::mobile().width);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = BrowserlessClient::new("http://localhost:3000/", Some("tok"));
        assert_eq!(
            client.endpoint("/content"),
            "http://localhost:3000/content?token=tok"
        );
    }
}
