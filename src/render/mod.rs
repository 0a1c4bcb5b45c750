//! Page rendering backends.
//!
//! Everything past this module only ever sees the HTML string a backend
//! returns; which backend runs is a configuration choice.

pub mod browser;
pub mod chrome;
pub mod file;
pub mod http;
pub mod spider;

use async_trait::async_trait;

use crate::config::{RendererKind, Settings};
use crate::error::ScrapeError;

/// Turns a URL into HTML after whatever script execution the backend supports.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, ScrapeError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the configured backend.
///
/// Browser discovery happens here, so a missing binary is reported before any
/// network activity.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn Renderer>, ScrapeError> {
    let timeout = settings.render_timeout();
    Ok(match settings.renderer {
        RendererKind::Chrome => {
            let locator = browser::BrowserLocator::from_option(settings.browser_path.clone());
            let executable = locator.locate()?;
            Box::new(chrome::ChromeRenderer::new(
                executable,
                settings.user_agent.clone(),
                timeout,
            ))
        }
        RendererKind::Spider => Box::new(spider::SpiderRenderer::from_env(timeout)?),
        RendererKind::Http => Box::new(http::HttpRenderer::new(&settings.user_agent, timeout)?),
        RendererKind::File => {
            let path = settings.html_file.clone().ok_or_else(|| {
                ScrapeError::Config("the file renderer needs html_file (--html-file)".into())
            })?;
            Box::new(file::FileRenderer::new(path))
        }
    })
}
