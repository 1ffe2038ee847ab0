use super::GenerationService;
use crate::models::ImageSubmission;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned upstream outcome replayed by [`MockGenerationClient`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Success(String),
    Upstream { status: u16, body: serde_json::Value },
    Transport(String),
}

impl MockReply {
    pub fn text(text: &str) -> Self {
        MockReply::Success(
            serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
            })
            .to_string(),
        )
    }

    fn into_result(self) -> Result<String> {
        match self {
            MockReply::Success(body) => Ok(body),
            MockReply::Upstream { status, body } => Err(Error::Upstream {
                status,
                message: format!("Upstream API request failed with status {}", status),
                detail: Some(body),
            }),
            MockReply::Transport(detail) => Err(Error::Transport(detail)),
        }
    }
}

pub struct MockGenerationClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    submissions: Arc<Mutex<Vec<ImageSubmission>>>,
    delay: Option<Duration>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            submissions: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn submissions(&self) -> Vec<ImageSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, submission: &ImageSubmission) -> Result<String> {
        let count = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(submission.clone());
            submissions.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::text("A placeholder description.")
            } else {
                replies[(count - 1) % replies.len()].clone()
            }
        };

        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> ImageSubmission {
        ImageSubmission::encode(b"img", "image/png")
    }

    #[tokio::test]
    async fn test_mock_default_reply_is_text_body() {
        let client = MockGenerationClient::new();
        let body = client.generate(&submission()).await.unwrap();
        assert!(body.contains("placeholder"));
    }

    #[tokio::test]
    async fn test_mock_cycles_replies_and_counts_calls() {
        let client = MockGenerationClient::new()
            .with_reply(MockReply::text("first"))
            .with_reply(MockReply::Upstream {
                status: 503,
                body: serde_json::json!({"error": "busy"}),
            });

        assert!(client.generate(&submission()).await.unwrap().contains("first"));
        let err = client.generate(&submission()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));
        assert!(client.generate(&submission()).await.unwrap().contains("first"));

        assert_eq!(client.get_call_count(), 3);
        assert_eq!(client.submissions()[0].mime_type, "image/png");
    }
}
