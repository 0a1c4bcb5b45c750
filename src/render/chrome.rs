use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::Renderer;
use crate::error::ScrapeError;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Rendering is ready once the page carries at least one of these.
const READY_SELECTOR: &str = "script";

/// Headless Chromium driven over the DevTools protocol.
pub struct ChromeRenderer {
    executable: PathBuf,
    user_agent: String,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(executable: PathBuf, user_agent: String, timeout: Duration) -> Self {
        Self {
            executable,
            user_agent,
            timeout,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, ScrapeError> {
        BrowserConfig::builder()
            .chrome_executable(&self.executable)
            .request_timeout(self.timeout)
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(ScrapeError::Render)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        let config = self.browser_config()?;
        info!("Launching {}", self.executable.display());
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Render(format!("browser launch failed: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        // The browser is closed whatever happened while loading the page.
        let result = load(&browser, url, self.timeout).await;

        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Browser did not exit cleanly: {}", e);
        }
        join_events(events).await;

        result
    }

    fn name(&self) -> &'static str {
        "chrome"
    }
}

/// Wait for the handler task, logging instead of propagating its failure.
async fn join_events(events: JoinHandle<()>) -> bool {
    match events.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Browser event handler failed: {}", e);
            false
        }
    }
}

async fn load(browser: &Browser, url: &str, timeout: Duration) -> Result<String, ScrapeError> {
    // Navigation counts against the same budget as the readiness wait.
    let page = within(url, timeout, async {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| ScrapeError::Render(format!("navigation to {url} failed: {e}")))?;
        wait_ready(&page).await;
        Ok::<_, ScrapeError>(page)
    })
    .await?;

    page.content()
        .await
        .map_err(|e| ScrapeError::Render(format!("reading page content failed: {e}")))
}

/// Run `fut` under the render timeout, mapping expiry to `RenderTimeout`.
async fn within<T, F>(url: &str, timeout: Duration, fut: F) -> Result<T, ScrapeError>
where
    F: Future<Output = Result<T, ScrapeError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ScrapeError::RenderTimeout {
            url: url.to_string(),
            timeout,
        })?
}

async fn wait_ready(page: &Page) {
    loop {
        match page.find_element(READY_SELECTOR).await {
            Ok(_) => return,
            Err(e) => debug!("Page not ready yet: {}", e),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
