use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use labbot_agent::ChatbotRuntime;
use tower_http::cors::{Any, CorsLayer};

use crate::{chat, health};

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<ChatbotRuntime>,
}

impl AppState {
    pub fn new(runtime: Arc<ChatbotRuntime>) -> Self {
        Self { runtime }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .with_state(state)
        .layer(build_cors_layer())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use labbot_agent::{ChatbotRuntime, KnowledgeAgent};
    use labbot_core::{KeywordFallback, SystemPrompt};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, AppState};

    struct ScriptedAgent {
        output: Option<&'static str>,
    }

    #[async_trait]
    impl KnowledgeAgent for ScriptedAgent {
        async fn respond(&self, _query: &str, _instructions: &str) -> Result<String> {
            self.output.map(str::to_string).ok_or_else(|| anyhow!("agent offline"))
        }
    }

    fn runtime(output: Option<&'static str>) -> Arc<ChatbotRuntime> {
        Arc::new(ChatbotRuntime::new(
            Arc::new(ScriptedAgent { output }),
            Arc::new(KeywordFallback::default()),
            SystemPrompt::default(),
        ))
    }

    fn app(runtime: Arc<ChatbotRuntime>) -> Router {
        router(AppState::new(runtime))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn chat_request(message: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "message": message }).to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn root_reports_running_service() {
        let request = Request::builder().uri("/").body(Body::empty()).expect("request");

        let (status, body) = send(app(runtime(None)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Lab of Future Chatbot API is running!", "status": "healthy"})
        );
    }

    #[tokio::test]
    async fn health_reflects_runtime_lifecycle() {
        let runtime = runtime(None);
        let request = || Request::builder().uri("/health").body(Body::empty()).expect("request");

        let (_, before) = send(app(runtime.clone()), request()).await;
        assert_eq!(before["chatbot"], "unavailable");

        runtime.initialize();
        let (status, after) = send(app(runtime.clone()), request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["status"], "healthy");
        assert_eq!(after["chatbot"], "ready");
        assert!(after["timestamp"].is_string());
    }

    #[tokio::test]
    async fn chat_returns_cleaned_course_titles() {
        let runtime = runtime(Some(
            "\u{1b}[2mthinking...\u{1b}[0m\n1. **Robotics**: build robots\n2. **AI Basics**: learn AI",
        ));
        runtime.initialize();

        let (status, body) = send(app(runtime), chat_request("What courses do you offer?")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["response"],
            "Robotics\nAI Basics\n\nWould you like to know how to enroll in one of these programs?"
        );
    }

    #[tokio::test]
    async fn chat_agent_failure_is_a_friendly_message_not_an_error() {
        let runtime = runtime(None);
        runtime.initialize();

        let (status, body) = send(app(runtime), chat_request("What courses do you offer?")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], SystemPrompt::default().error_message());
    }

    #[tokio::test]
    async fn chat_on_unavailable_runtime_returns_internal_error_detail() {
        let (status, body) =
            send(app(runtime(None)), chat_request("What courses do you offer?")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["detail"],
            "Internal server error: chatbot runtime unavailable: chatbot is not initialized"
        );
    }

    #[tokio::test]
    async fn chat_with_malformed_body_returns_bad_request_detail() {
        let runtime = runtime(Some("unused"));
        runtime.initialize();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "message": 5 }).to_string()))
            .expect("request");

        let (status, body) = send(app(runtime), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().expect("detail should be a string");
        assert!(detail.starts_with("Bad request: "), "unexpected detail {detail:?}");
        assert!(detail.contains("message"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/chat")
            .header(header::ORIGIN, "https://lab.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .expect("request");

        let response = app(runtime(None)).oneshot(request).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok()),
            Some("*")
        );
        let methods = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(methods.contains("POST"));
        assert!(methods.contains("DELETE"));
    }
}
