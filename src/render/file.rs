use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use super::Renderer;
use crate::error::ScrapeError;

/// Serves a saved page. The URL is only logged.
pub struct FileRenderer {
    path: PathBuf,
}

impl FileRenderer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Renderer for FileRenderer {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        info!("Reading {} in place of {}", self.path.display(), url);
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ScrapeError::fs(&self.path, e))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
