use std::time::Duration;

use async_trait::async_trait;
use spider_client::shapes::request::{RequestType, ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tracing::info;

use super::Renderer;
use crate::error::ScrapeError;

/// spider.cloud in chrome mode, raw HTML back.
pub struct SpiderRenderer {
    spider: Spider,
    timeout: Duration,
}

impl SpiderRenderer {
    pub fn from_env(timeout: Duration) -> Result<Self, ScrapeError> {
        let api_key = std::env::var("SPIDER_API_KEY").map_err(|_| {
            ScrapeError::Config("SPIDER_API_KEY environment variable must be set".into())
        })?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| ScrapeError::Render(format!("failed to create Spider client: {e}")))?;
        Ok(Self { spider, timeout })
    }
}

#[async_trait]
impl Renderer for SpiderRenderer {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        let params = RequestParams {
            request: Some(RequestType::Chrome),
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
            ..Default::default()
        };

        info!("Rendering via spider.cloud: {}", url);
        let response = tokio::time::timeout(
            self.timeout,
            self.spider.scrape_url(url, Some(params), "application/json"),
        )
        .await
        .map_err(|_| ScrapeError::RenderTimeout {
            url: url.to_string(),
            timeout: self.timeout,
        })?
        .map_err(|e| ScrapeError::Render(format!("spider scrape failed: {e}")))?;

        first_content(response)
            .ok_or_else(|| ScrapeError::Render("no content in spider response".into()))
    }

    fn name(&self) -> &'static str {
        "spider"
    }
}

/// The API answers with a JSON array (sometimes itself JSON-encoded as a
/// string) whose first element carries `content`.
fn first_content(value: serde_json::Value) -> Option<String> {
    let parsed: serde_json::Value = match value.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
        None => value,
    };

    parsed
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}
