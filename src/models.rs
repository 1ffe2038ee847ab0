//! Data models and structures
//!
//! Defines the per-request data exchanged between the client controller, the
//! proxy endpoint and the upstream generation API, plus runtime configuration.

use crate::ai::mime;
use crate::{prompts, Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// A base64 image payload ready to be sent to the proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSubmission {
    #[serde(rename = "imageData")]
    pub data: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionBody {
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

impl ImageSubmission {
    /// Encodes raw image bytes without a data-URL prefix.
    pub fn encode(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Parses and validates a JSON request body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let body: SubmissionBody = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;

        let data = body
            .image_data
            .ok_or_else(|| Error::Validation("Missing required field 'imageData'".to_string()))?;

        let submission = Self {
            data,
            mime_type: body
                .mime_type
                .map(|m| m.trim().to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        };
        submission.validate()?;
        Ok(submission)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.trim().is_empty() {
            return Err(Error::Validation(
                "Field 'imageData' must not be empty".to_string(),
            ));
        }

        self.decode_bytes()?;

        if !mime::is_recognized_image_mime(&self.mime_type) {
            return Err(Error::Validation(format!(
                "Unsupported mimeType '{}'; expected one of: {}",
                self.mime_type,
                mime::RECOGNIZED_IMAGE_MIME_TYPES.join(", ")
            )));
        }

        Ok(())
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| {
                Error::Validation(format!("Field 'imageData' is not valid base64: {}", e))
            })
    }
}

/// Generated description, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltTextResult(String);

impl AltTextResult {
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AltTextResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const MISSING_API_KEY_MESSAGE: &str = "API key is not set.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing your request.";

/// Error response produced by the proxy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyError {
    #[serde(skip)]
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ProxyError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method not allowed; use POST")
    }
}

impl From<Error> for ProxyError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => Self::new(400, message),
            Error::Config(_) => Self::new(500, MISSING_API_KEY_MESSAGE),
            Error::Upstream {
                status,
                message,
                detail,
            } => Self {
                status_code: status,
                message,
                detail,
            },
            Error::Proxy { status, message } => Self::new(status, message),
            Error::Transport(detail) => Self {
                status_code: 500,
                message: INTERNAL_ERROR_MESSAGE.to_string(),
                detail: Some(serde_json::Value::String(detail)),
            },
            _ => Self::new(500, INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// A file handed to the client controller by a picker or a drop.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    /// Declared media type, as reported by the picker.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Knobs that shape the upstream generation request.
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            prompt: prompts::ALT_TEXT.trim().to_string(),
            temperature: 0.2,
            max_output_tokens: 100,
            candidate_count: 1,
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent credentials are reported per request, not at startup.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub policy: GenerationPolicy,
    pub upstream_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub max_request_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GenerationPolicy::default();

        let policy = GenerationPolicy {
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.model),
            prompt: defaults.prompt,
            temperature: parse_var(&lookup, "ALT_TEXT_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: parse_var(
                &lookup,
                "ALT_TEXT_MAX_OUTPUT_TOKENS",
                defaults.max_output_tokens,
            )?,
            candidate_count: defaults.candidate_count,
        };

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| crate::ai::gemini::DEFAULT_BASE_URL.to_string()),
            policy,
            upstream_timeout: Duration::from_secs(parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?),
            bind_addr: parse_var(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            max_request_bytes: parse_var(&lookup, "MAX_REQUEST_BYTES", 16 * 1024 * 1024)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} has an invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
