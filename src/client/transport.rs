use crate::models::ImageSubmission;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Raw answer from the proxy endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: String,
}

impl ProxyReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait ProxyTransport: Send + Sync {
    async fn send(&self, submission: &ImageSubmission) -> Result<ProxyReply>;
}

/// Posts submissions to the proxy endpoint over HTTP.
///
/// No explicit timeout is configured; the transport default applies.
pub struct HttpProxyTransport {
    client: Client,
    endpoint: String,
}

impl HttpProxyTransport {
    pub fn new(endpoint: String) -> Self {
        Self::new_with_client(endpoint, Client::new())
    }

    pub fn new_with_client(endpoint: String, client: Client) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl ProxyTransport for HttpProxyTransport {
    async fn send(&self, submission: &ImageSubmission) -> Result<ProxyReply> {
        tracing::debug!("Posting submission to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .await
            .map_err(|e| {
                let e = Error::transport(e);
                tracing::error!("Failed to reach proxy: {}", e);
                e
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(Error::transport)?;

        Ok(ProxyReply { status, body })
    }
}
