//! HTTP surface for the proxy endpoint.

use crate::models::{Config, ProxyError};
use crate::proxy::{handle_generate, ProxyState};
use crate::Result;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const GENERATE_PATH: &str = "/api/generate-alt-text";

pub fn router(state: Arc<ProxyState>, max_request_bytes: usize) -> Router {
    Router::new()
        .route(GENERATE_PATH, any(generate_alt_text))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The body is taken fallibly so that the method check in [`handle_generate`]
/// runs before any body-limit rejection.
async fn generate_alt_text(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) if method == Method::POST => {
            warn!("Rejected unreadable request body: {}", rejection.body_text());
            return ProxyError::new(rejection.status().as_u16(), rejection.body_text())
                .into_response();
        }
        Err(_) => Bytes::new(),
    };

    handle_generate(&state, &method, &body).await.into_response()
}

/// Binds `config.bind_addr` and serves until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    let state = Arc::new(ProxyState::from_config(&config, reqwest::Client::new()));
    let app = router(state, config.max_request_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(
        "Alt-text proxy listening on http://{}{}",
        listener.local_addr()?,
        GENERATE_PATH
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerationService, MockGenerationClient, MockReply};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn app_with(mock: Arc<MockGenerationClient>) -> Router {
        let state = Arc::new(ProxyState::new(Some(mock as Arc<dyn GenerationService>)));
        router(state, 1024 * 1024)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_relays_upstream_json() {
        let mock = Arc::new(
            MockGenerationClient::new().with_reply(MockReply::text("A dog running on a beach.")),
        );
        let app = app_with(mock.clone());

        let response = app
            .oneshot(
                Request::post(GENERATE_PATH)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"imageData":"aGVsbG8=","mimeType":"image/png"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let json = body_json(response).await;
        assert_eq!(
            json["candidates"][0]["content"]["parts"][0]["text"],
            "A dog running on a beach."
        );
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_is_rejected_with_allow_header() {
        let mock = Arc::new(MockGenerationClient::new());
        let app = app_with(mock.clone());

        let response = app
            .oneshot(Request::get(GENERATE_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_post_with_oversized_body_is_still_405() {
        let state = Arc::new(ProxyState::new(Some(
            Arc::new(MockGenerationClient::new()) as Arc<dyn GenerationService>
        )));
        let app = router(state, 16);

        let response = app
            .oneshot(
                Request::get(GENERATE_PATH)
                    .body(Body::from(vec![b'x'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    #[tokio::test]
    async fn test_oversized_post_is_413_json() {
        let mock = Arc::new(MockGenerationClient::new());
        let state = Arc::new(ProxyState::new(Some(mock.clone() as Arc<dyn GenerationService>)));
        let app = router(state, 16);

        let body = format!(r#"{{"imageData":"{}"}}"#, "A".repeat(64));
        let response = app
            .oneshot(Request::post(GENERATE_PATH).body(Body::from(body)).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert!(json["message"].is_string());
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_data_returns_400_json() {
        let mock = Arc::new(MockGenerationClient::new());
        let app = app_with(mock.clone());

        let response = app
            .oneshot(
                Request::post(GENERATE_PATH)
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().contains("imageData"));
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_returns_500() {
        let state = Arc::new(ProxyState::new(None));
        let app = router(state, 1024);

        let response = app
            .oneshot(
                Request::post(GENERATE_PATH)
                    .body(Body::from(r#"{"imageData":"aGVsbG8="}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "API key is not set.");
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = app_with(Arc::new(MockGenerationClient::new()));
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
