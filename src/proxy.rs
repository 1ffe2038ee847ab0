//! Proxy endpoint
//!
//! Holds the upstream credential, validates image submissions, forwards them
//! to the generation service and relays the outcome. Each request is handled
//! in a single hop: it is either rejected (wrong method, missing credential,
//! invalid body) or forwarded and its upstream result relayed.

use crate::ai::{GenerationService, GeminiAltTextClient};
use crate::models::{Config, ImageSubmission, ProxyError, MISSING_API_KEY_MESSAGE};
use crate::Error;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{info, warn};

/// Read-only state shared by every proxy invocation.
pub struct ProxyState {
    /// `None` when the upstream credential is not configured.
    generator: Option<Arc<dyn GenerationService>>,
}

impl ProxyState {
    pub fn new(generator: Option<Arc<dyn GenerationService>>) -> Self {
        Self { generator }
    }

    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let generator = config.gemini_api_key.as_ref().map(|api_key| {
            info!(
                "Upstream provider: Gemini (model: {})",
                config.policy.model
            );
            Arc::new(
                GeminiAltTextClient::new_with_client(
                    api_key.clone(),
                    config.policy.clone(),
                    config.upstream_timeout,
                    http_client,
                )
                .with_base_url(config.gemini_base_url.clone()),
            ) as Arc<dyn GenerationService>
        });

        if generator.is_none() {
            warn!("GEMINI_API_KEY is not set; every request will be rejected with 500");
        }

        Self::new(generator)
    }
}

/// Terminal outcome of one proxy invocation.
#[derive(Debug)]
pub enum ProxyOutcome {
    /// Upstream success body, relayed unchanged.
    Relayed(String),
    Rejected(ProxyError),
}

pub async fn handle_generate(state: &ProxyState, method: &Method, body: &[u8]) -> ProxyOutcome {
    if *method != Method::POST {
        info!("Rejected {} request to generate endpoint", method);
        return ProxyOutcome::Rejected(ProxyError::method_not_allowed());
    }

    let Some(generator) = state.generator.as_ref() else {
        tracing::error!("Upstream credential missing; refusing request");
        return ProxyOutcome::Rejected(Error::Config(MISSING_API_KEY_MESSAGE.to_string()).into());
    };

    let submission = match ImageSubmission::parse(body) {
        Ok(submission) => submission,
        Err(e) => {
            info!("Rejected invalid submission: {}", e);
            return ProxyOutcome::Rejected(e.into());
        }
    };

    match generator.generate(&submission).await {
        Ok(body) => {
            info!("Relaying upstream success ({} bytes)", body.len());
            ProxyOutcome::Relayed(body)
        }
        Err(e) => {
            warn!("Upstream request failed: {}", e);
            ProxyOutcome::Rejected(e.into())
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, axum::Json(&self)).into_response();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }

        response
    }
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response {
        match self {
            ProxyOutcome::Relayed(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            ProxyOutcome::Rejected(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockGenerationClient, MockReply};
    use pretty_assertions::assert_eq;

    const VALID_BODY: &[u8] = br#"{"imageData":"/9j/4AAQ","mimeType":"image/jpeg"}"#;

    fn state_with(mock: Arc<MockGenerationClient>) -> ProxyState {
        ProxyState::new(Some(mock as Arc<dyn GenerationService>))
    }

    fn rejected(outcome: ProxyOutcome) -> ProxyError {
        match outcome {
            ProxyOutcome::Rejected(err) => err,
            ProxyOutcome::Relayed(body) => panic!("expected rejection, got body {body}"),
        }
    }

    #[tokio::test]
    async fn test_non_post_is_405_regardless_of_body() {
        let mock = Arc::new(MockGenerationClient::new());
        let state = state_with(mock.clone());

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let err = rejected(handle_generate(&state, &method, VALID_BODY).await);
            assert_eq!(err.status_code, 405);
            assert!(err.message.contains("POST"));
        }
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_without_upstream_call() {
        let state = ProxyState::new(None);
        let err = rejected(handle_generate(&state, &Method::POST, VALID_BODY).await);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.message, MISSING_API_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_credential_from_config() {
        let config = Config::from_lookup(|_| None).unwrap();
        let state = ProxyState::from_config(&config, reqwest::Client::new());
        let err = rejected(handle_generate(&state, &Method::POST, VALID_BODY).await);
        assert_eq!(err.status_code, 500);
    }

    #[tokio::test]
    async fn test_missing_image_data_is_400_without_upstream_call() {
        let mock = Arc::new(MockGenerationClient::new());
        let state = state_with(mock.clone());

        let err = rejected(handle_generate(&state, &Method::POST, br#"{"mimeType":"image/png"}"#).await);
        assert_eq!(err.status_code, 400);
        assert!(err.message.contains("imageData"));
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_400() {
        let mock = Arc::new(MockGenerationClient::new());
        let state = state_with(mock.clone());

        let err = rejected(
            handle_generate(&state, &Method::POST, br#"{"imageData":"%%%"}"#).await,
        );
        assert_eq!(err.status_code, 400);
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_relays_body_unchanged() {
        let reply = MockReply::text("A dog running on a beach.");
        let expected = match &reply {
            MockReply::Success(body) => body.clone(),
            _ => unreachable!(),
        };
        let mock = Arc::new(MockGenerationClient::new().with_reply(reply));
        let state = state_with(mock.clone());

        match handle_generate(&state, &Method::POST, VALID_BODY).await {
            ProxyOutcome::Relayed(body) => assert_eq!(body, expected),
            ProxyOutcome::Rejected(err) => panic!("unexpected rejection: {err:?}"),
        }

        let sent = mock.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data, "/9j/4AAQ");
    }

    #[tokio::test]
    async fn test_default_mime_type_reaches_upstream() {
        let mock = Arc::new(MockGenerationClient::new());
        let state = state_with(mock.clone());

        handle_generate(&state, &Method::POST, br#"{"imageData":"/9j/4AAQ"}"#).await;
        assert_eq!(mock.submissions()[0].mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_upstream_status_is_passed_through() {
        let mock = Arc::new(MockGenerationClient::new().with_reply(MockReply::Upstream {
            status: 503,
            body: serde_json::json!({"error": {"message": "overloaded"}}),
        }));
        let state = state_with(mock);

        let err = rejected(handle_generate(&state, &Method::POST, VALID_BODY).await);
        assert_eq!(err.status_code, 503);
        assert_eq!(
            err.detail,
            Some(serde_json::json!({"error": {"message": "overloaded"}}))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic_500() {
        let mock = Arc::new(
            MockGenerationClient::new()
                .with_reply(MockReply::Transport("connection reset".to_string())),
        );
        let state = state_with(mock);

        let err = rejected(handle_generate(&state, &Method::POST, VALID_BODY).await);
        assert_eq!(err.status_code, 500);
        assert_eq!(err.message, crate::models::INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_405_response_carries_allow_header() {
        let response = ProxyError::method_not_allowed().into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }
}
