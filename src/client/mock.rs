use super::transport::{ProxyReply, ProxyTransport};
use crate::models::ImageSubmission;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockProxyTransport {
    replies: Arc<Mutex<Vec<ProxyReply>>>,
    sent: Arc<Mutex<Vec<ImageSubmission>>>,
    delay: Option<Duration>,
    unreachable: bool,
}

impl MockProxyTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            unreachable: false,
        }
    }

    /// Fails every send as if the proxy could not be reached.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new()
        }
    }

    pub fn with_reply(self, status: u16, body: serde_json::Value) -> Self {
        self.replies.lock().unwrap().push(ProxyReply {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<ImageSubmission> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockProxyTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProxyTransport for MockProxyTransport {
    async fn send(&self, submission: &ImageSubmission) -> Result<ProxyReply> {
        let count = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(submission.clone());
            sent.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.unreachable {
            return Err(Error::Transport("connection refused".to_string()));
        }

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok(ProxyReply {
                status: 200,
                body: serde_json::json!({
                    "candidates": [{ "content": { "parts": [{ "text": "A placeholder description." }] } }]
                })
                .to_string(),
            })
        } else {
            Ok(replies[(count - 1) % replies.len()].clone())
        }
    }
}
