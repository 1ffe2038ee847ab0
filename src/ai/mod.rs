//! Upstream AI service integration
//!
//! Defines the generation seam used by the proxy endpoint and its Gemini and
//! mock implementations.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{decode_alt_text, GeminiAltTextClient};
pub use mock::{MockGenerationClient, MockReply};

use crate::models::ImageSubmission;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Sends a validated submission upstream and returns the raw success body.
    ///
    /// Non-success upstream statuses surface as [`crate::Error::Upstream`].
    async fn generate(&self, submission: &ImageSubmission) -> Result<String>;
}
