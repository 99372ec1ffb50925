use crate::traits::Transport;
use crate::types::{RelayError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: "Competition-Relay/0.1".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
        }
    }
}

/// [`Transport`] backed by a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }

    async fn read_text(response: Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: String, params: &[(&str, String)]) -> Result<String> {
        let start_time = Instant::now();
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(url)
            .query(params)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let text = Self::read_text(response).await?;
        debug!("POST {} answered in {}ms", url, start_time.elapsed().as_millis());
        Ok(text)
    }

    async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String> {
        let start_time = Instant::now();
        debug!("GET {}", url);

        let response = self.client.get(url).query(params).send().await?;

        let text = Self::read_text(response).await?;
        debug!("GET {} answered in {}ms", url, start_time.elapsed().as_millis());
        Ok(text)
    }
}
