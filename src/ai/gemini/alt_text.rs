//! Alt-text generation against Gemini `generateContent`.

use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::{mime, GenerationService};
use crate::models::{AltTextResult, GenerationPolicy, ImageSubmission};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiAltTextClient {
    http: GeminiHttpClient,
    policy: GenerationPolicy,
}

impl GeminiAltTextClient {
    pub fn new(api_key: String, policy: GenerationPolicy, timeout: Duration) -> Self {
        Self::new_with_client(api_key, policy, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        policy: GenerationPolicy,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, policy.model.clone(), timeout, client),
            policy,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn build_request(&self, submission: &ImageSubmission) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: self.policy.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: submission.mime_type.clone(),
                            data: submission.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.policy.temperature,
                max_output_tokens: self.policy.max_output_tokens,
                candidate_count: self.policy.candidate_count,
            },
        }
    }
}

#[async_trait]
impl GenerationService for GeminiAltTextClient {
    async fn generate(&self, submission: &ImageSubmission) -> Result<String> {
        if let Ok(bytes) = submission.decode_bytes() {
            match mime::detect_image_mime(&bytes) {
                Some(sniffed) if !sniffed.eq_ignore_ascii_case(&submission.mime_type) => {
                    tracing::warn!(
                        "Declared mime type {} does not match image content ({})",
                        submission.mime_type,
                        sniffed
                    );
                }
                _ => {}
            }
        }

        tracing::debug!(
            "Requesting alt text from Gemini model {} ({} base64 chars, {})",
            self.http.model(),
            submission.data.len(),
            submission.mime_type
        );

        let request = self.build_request(submission);
        self.http.generate_content(&request).await
    }
}

/// Decodes a relayed `generateContent` body into the generated description.
pub fn decode_alt_text(body: &str) -> Result<AltTextResult> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!("Unexpected API response structure: {}", e);
        Error::ResponseShape(format!("response is not a generateContent body: {}", e))
    })?;

    let candidate = response.candidates.first().ok_or_else(|| {
        Error::ResponseShape(match response.prompt_feedback {
            Some(feedback) => format!("no candidates returned (prompt feedback: {})", feedback),
            None => "no candidates returned".to_string(),
        })
    })?;

    let text = candidate
        .content
        .as_ref()
        .and_then(|c| {
            c.parts.iter().find_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
        })
        .ok_or_else(|| {
            Error::ResponseShape(format!(
                "first candidate has no text part (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

    AltTextResult::new(text)
        .ok_or_else(|| Error::ResponseShape("generated text is empty".to_string()))
}
