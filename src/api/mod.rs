//! HTTP API over the chat service, the tool registry and video generation.
//!
//! Every response body carries a `status` discriminator (`success` or
//! `error`). Tool endpoints answer 200 even when the tool itself failed, so
//! clients branch on `status` rather than on the HTTP code alone.

mod error;
mod handlers;

pub use error::{ApiError, ApiResult};

use crate::session::ChatService;
use crate::tools::ToolRegistry;
use crate::video::VeoClient;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub tools: Arc<ToolRegistry>,
    pub video: Arc<VeoClient>,
}

/// Build the `/api` router with CORS restricted to `cors_origins`.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/history/{session_id}", get(handlers::history))
        .route("/api/chat/session", post(handlers::create_session))
        .route("/api/health", get(handlers::health))
        .route("/api/generate-video", post(handlers::generate_video))
        .route("/api/tools", get(handlers::list_tools))
        .route("/api/tools/{name}", post(handlers::run_tool))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::CompletionAgent;
    use crate::error::{AgencyError, Result};
    use crate::retry::RetryPolicy;
    use crate::session::MemorySessionStore;
    use crate::tools::KeywordExtractor;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    struct EchoAgent;

    #[async_trait]
    impl CompletionAgent for EchoAgent {
        async fn get_completion(&self, prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", prompt))
        }
    }

    struct DownAgent;

    #[async_trait]
    impl CompletionAgent for DownAgent {
        async fn get_completion(&self, _prompt: &str) -> Result<String> {
            Err(AgencyError::OpenAI("service unavailable".to_string()))
        }
    }

    fn app_with(agent: Arc<dyn CompletionAgent>) -> Router {
        let store = Arc::new(MemorySessionStore::new());
        let mut tools = ToolRegistry::new();
        tools.register(KeywordExtractor);
        let video = VeoClient::new(
            None,
            "veo-test",
            std::env::temp_dir(),
            RetryPolicy::new(1, Duration::ZERO),
        )
        .unwrap();

        let state = AppState {
            chat: Arc::new(ChatService::new(store, agent)),
            tools: Arc::new(tools),
            video: Arc::new(video),
        };
        router(state, &["http://localhost:3000".to_string()])
    }

    fn app() -> Router {
        app_with(Arc::new(EchoAgent))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["message"], "Content Creation Agency API is running");
    }

    #[tokio::test]
    async fn test_chat_creates_session_and_records_history() {
        let app = app();
        let (status, body) = send(&app, post_json("/api/chat", json!({ "message": "hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["response"], "echo: hi");
        assert!(body["messageId"].is_string());
        assert!(body["timestamp"].is_string());

        let session_id = body["sessionId"].as_str().unwrap().to_string();
        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                json!({ "message": "again", "sessionId": session_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionId"], session_id.as_str());

        let (status, body) = send(&app, get(&format!("/api/chat/history/{}", session_id))).await;
        assert_eq!(status, StatusCode::OK);
        let history = body["history"].as_array().unwrap();
        let roles: Vec<&str> = history.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["user", "assistant", "user", "assistant"]);
        assert_eq!(history[3]["content"], "echo: again");
        assert!(history[0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_session_id_starts_new_session() {
        let (status, body) = send(
            &app(),
            post_json("/api/chat", json!({ "message": "hi", "sessionId": "bogus" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(body["sessionId"], "bogus");
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_or_malformed_message() {
        let app = app();
        let (status, body) = send(&app, post_json("/api/chat", json!({ "sessionId": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "No message provided");

        let request = Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");

        let (status, _) = send(&app, post_json("/api/chat", json!({ "message": 42 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_of_unknown_session_is_404() {
        let (status, body) = send(&app(), get("/api/chat/history/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_create_session_starts_empty() {
        let app = app();
        let request = Request::post("/api/chat/session").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let session_id = body["sessionId"].as_str().unwrap();

        let (_, body) = send(&app, get(&format!("/api/chat/history/{}", session_id))).await;
        assert_eq!(body["history"], json!([]));
    }

    #[tokio::test]
    async fn test_agent_failure_is_500_and_keeps_user_message() {
        let app = app_with(Arc::new(DownAgent));
        let request = Request::post("/api/chat/session").body(Body::empty()).unwrap();
        let (_, body) = send(&app, request).await;
        let session_id = body["sessionId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            post_json(
                "/api/chat",
                json!({ "message": "hello", "sessionId": session_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("service unavailable"));

        let (_, body) = send(&app, get(&format!("/api/chat/history/{}", session_id))).await;
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["role"], "user");
    }

    #[tokio::test]
    async fn test_tools_listing_and_invocation() {
        let app = app();
        let (status, body) = send(&app, get("/api/tools")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"][0]["name"], "keyword_extractor");

        let (status, body) = send(
            &app,
            post_json(
                "/api/tools/keyword_extractor",
                json!({ "text": "rust tokio rust axum" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["keywords"][0]["keyword"], "rust");

        let (status, body) = send(&app, post_json("/api/tools/nope", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_generate_video_validation() {
        let app = app();
        let (status, body) = send(&app, post_json("/api/generate-video", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No script provided");

        let (status, body) = send(
            &app,
            post_json("/api/generate-video", json!({ "script": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_configured_origin() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }
}
