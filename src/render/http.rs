use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::Renderer;
use crate::error::ScrapeError;

/// Plain GET. Only useful when the records are in the served HTML, since no
/// script runs.
pub struct HttpRenderer {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRenderer {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Render(format!("http client: {e}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        info!("Fetching {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScrapeError::RenderTimeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            } else {
                ScrapeError::Render(format!("GET {url} failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Render(format!("GET {url} returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::Render(format!("reading body of {url} failed: {e}")))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Accepts connections and holds them open without answering.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/")
    }

    /// Answers every connection with `response`, then closes it.
    async fn canned_server(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let url = silent_server().await;
        let timeout = Duration::from_secs(1);
        let renderer = HttpRenderer::new("bookcase_scraper-test", timeout).unwrap();

        let err = renderer.render(&url).await.unwrap_err();
        match err {
            ScrapeError::RenderTimeout { url: u, timeout: t } => {
                assert_eq!(u, url);
                assert_eq!(t, timeout);
            }
            other => panic!("expected RenderTimeout, got {other}"),
        }
        assert_eq!(
            ScrapeError::RenderTimeout { url, timeout }.exit_code(),
            crate::error::EXIT_FAILURE
        );
    }

    #[tokio::test]
    async fn body_is_returned() {
        let url = canned_server(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>",
        )
        .await;
        let renderer = HttpRenderer::new("bookcase_scraper-test", Duration::from_secs(5)).unwrap();
        assert_eq!(renderer.render(&url).await.unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn error_status_fails() {
        let url = canned_server(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let renderer = HttpRenderer::new("bookcase_scraper-test", Duration::from_secs(5)).unwrap();
        let err = renderer.render(&url).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Render(ref m) if m.contains("503")), "{err}");
    }
}
