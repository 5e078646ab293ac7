use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("weather-cli/", env!("CARGO_PKG_VERSION"));

/// Raw result of a GET: status code and body text, nothing interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs an HTTP GET. Implementations only report failures to complete the
/// request; status interpretation is up to the caller.
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError> {
        tracing::debug!(url, ?query, "GET");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|e| FetchError::Network(e.to_string()))?;

        tracing::debug!(url, status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}
