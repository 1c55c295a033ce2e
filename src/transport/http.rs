//! Single-attempt HTTP transport backed by reqwest

use super::config::TransportConfig;
use super::error::FetchError;
use super::Transport;
use reqwest::Client as ReqwestClient;
use tracing::{debug, instrument};

/// HTTP transport performing exactly one request per `fetch`
///
/// Wrap it in [`super::RetryingTransport`] for politeness delays and retries.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Create a transport from the given configuration
    pub fn new(config: &TransportConfig) -> Result<Self, FetchError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("GET {} returned {}", url, status);
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        debug!("GET {} returned {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RetryPolicy, RetryingTransport, fetch_text};
    use std::time::Duration;

    fn quick_config() -> TransportConfig {
        TransportConfig::builder()
            .timeout(Duration::from_secs(5))
            .politeness_delay(Duration::ZERO, Duration::ZERO)
            .retry(RetryPolicy::immediate(5))
            .build()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/wydarzenia")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body>  ok  </body></html>")
            .expect(1)
            .create_async()
            .await;

        let transport = HttpTransport::new(&quick_config()).unwrap();
        let text = fetch_text(&transport, &format!("{}/wydarzenia", server.url()))
            .await
            .unwrap();
        assert_eq!(text, "<html><body> ok </body></html>");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let transport = HttpTransport::new(&quick_config()).unwrap();
        let result = transport.fetch(&format!("{}/missing", server.url())).await;
        assert_eq!(result, Err(FetchError::HttpStatus(404)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retrying_transport_gives_up_on_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(5)
            .create_async()
            .await;

        let config = quick_config();
        let transport = RetryingTransport::new(HttpTransport::new(&config).unwrap(), &config);
        let result = transport.fetch(&format!("{}/flaky", server.url())).await;
        assert_eq!(result, Err(FetchError::HttpStatus(503)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retrying_transport_does_not_retry_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/gone")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let config = quick_config();
        let transport = RetryingTransport::new(HttpTransport::new(&config).unwrap(), &config);
        let result = transport.fetch(&format!("{}/gone", server.url())).await;
        assert_eq!(result, Err(FetchError::HttpStatus(404)));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // bind and drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(&quick_config()).unwrap();
        let err = transport
            .fetch(&format!("http://127.0.0.1:{}/", port))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error: {:?}", err);
    }
}
