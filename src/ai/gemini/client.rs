use super::types::ErrorEnvelope;
use crate::{Error, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client.
///
/// The credential travels in the `x-goog-api-key` header so that request URLs,
/// and any error text derived from them, never carry it.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` may be given bare (`gemini-2.0-flash`) or with the `models/`
    /// prefix; the prefix is stripped.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls `generateContent` and returns the raw success body.
    pub async fn generate_content<Req: Serialize>(&self, request: &Req) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!("Failed to send request to Gemini: {}", e);
                Error::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(Error::transport)?;

        if !status.is_success() {
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(upstream_error(status.as_u16(), &body));
        }

        tracing::debug!("Gemini returned {} bytes", body.len());
        Ok(body)
    }
}

fn upstream_error(status: u16, body: &str) -> Error {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));

    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => format!("Upstream API request failed with status {}", status),
    };

    Error::Upstream {
        status,
        message,
        detail: Some(detail),
    }
}
