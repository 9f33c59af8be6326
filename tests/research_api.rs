use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use research_assistant::{
    research_toolkit, router, Agent, AgentRunner, AppState, GeminiClient, LanguageModel,
    ModelConfig, ResearchError, Result,
};
use serde_json::Value;
use tower::ServiceExt;

/// Agent stand-in that always answers with the same text.
struct FixedAnswer(&'static str);

#[async_trait]
impl AgentRunner for FixedAnswer {
    async fn run(&self, _query: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Agent stand-in that remembers every query it was given.
#[derive(Default)]
struct RecordingAgent {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl AgentRunner for RecordingAgent {
    async fn run(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok("recorded".to_string())
    }
}

/// Model that counts calls and fails until `fail_first` calls have been made.
struct CountingModel {
    calls: AtomicUsize,
    fail_first: usize,
    reply: &'static str,
}

impl CountingModel {
    fn new(fail_first: usize, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_first,
            reply,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for CountingModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(ResearchError::LanguageModel("gemini rate limit exceeded: quota".into()));
        }
        Ok(self.reply.to_string())
    }
}

fn app_with_model(model: Arc<CountingModel>) -> Router {
    let tools = research_toolkit(model.clone());
    let agent = Agent::new(model, tools).with_max_steps(3);
    router(AppState::new(Arc::new(agent)))
}

fn research_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/research")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_returns_fixed_message() {
    let app = router(AppState::new(Arc::new(FixedAnswer("unused"))));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(
        &body[..],
        br#"{"message":"Gemini-Powered Research Assistant API"}"#
    );
}

#[tokio::test]
async fn research_returns_agent_answer() {
    let app = router(AppState::new(Arc::new(FixedAnswer(
        "Quantum computing uses qubits.",
    ))));

    let response = app
        .oneshot(research_request(r#"{"query":"Summarize quantum computing"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], br#"{"answer":"Quantum computing uses qubits."}"#);
}

#[tokio::test]
async fn research_runs_the_real_agent_loop() {
    let model = CountingModel::new(0, "Thought: easy\nFinal Answer: Quantum computing uses qubits.");
    let app = app_with_model(model.clone());

    let response = app
        .oneshot(research_request(r#"{"query":"Summarize quantum computing"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["answer"],
        "Quantum computing uses qubits."
    );
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn malformed_bodies_are_rejected_before_the_model() {
    let model = CountingModel::new(0, "Final Answer: never");
    let app = app_with_model(model.clone());

    for body in [r#"{}"#, r#"{"query":42}"#, r#"{"query":"#, "not json"] {
        let response = app.clone().oneshot(research_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        let detail = json_body(response).await;
        assert!(detail["detail"].is_string(), "body: {body}");
    }

    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn missing_content_type_is_rejected() {
    let model = CountingModel::new(0, "Final Answer: never");
    let app = app_with_model(model.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/research")
                .body(Body::from(r#"{"query":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn provider_failure_maps_to_500_and_service_recovers() {
    let model = CountingModel::new(1, "Final Answer: recovered");
    let app = app_with_model(model.clone());

    let failed = app
        .clone()
        .oneshot(research_request(r#"{"query":"first"}"#))
        .await
        .unwrap();
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(failed).await["detail"],
        "language model error: gemini rate limit exceeded: quota"
    );

    let succeeded = app
        .oneshot(research_request(r#"{"query":"second"}"#))
        .await
        .unwrap();
    assert_eq!(succeeded.status(), StatusCode::OK);
    assert_eq!(json_body(succeeded).await["answer"], "recovered");
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn error_details_can_be_redacted() {
    let model = CountingModel::new(usize::MAX, "unused");
    let tools = research_toolkit(model.clone());
    let agent = Agent::new(model, tools);
    let app = router(AppState::new(Arc::new(agent)).with_error_details(false));

    let response = app
        .oneshot(research_request(r#"{"query":"secret"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["detail"], "internal server error");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = router(AppState::new(Arc::new(FixedAnswer("unused"))));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/ask")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Not Found");
}

#[tokio::test]
async fn empty_query_reaches_the_agent_unchanged() {
    let agent = Arc::new(RecordingAgent::default());
    let app = router(AppState::new(agent.clone()));

    let response = app
        .oneshot(research_request(r#"{"query":""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["answer"], "recorded");
    assert_eq!(*agent.queries.lock().unwrap(), vec![String::new()]);
}

#[tokio::test]
async fn exhausted_step_budget_maps_to_500() {
    let model = CountingModel::new(0, "Thought: look again\nAction: Search\nAction Input: qubits");
    let app = app_with_model(model.clone());

    let response = app
        .oneshot(research_request(r#"{"query":"never ends"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["detail"],
        "agent stopped after 3 steps without a final answer"
    );
    // Each step is one agent completion plus one Search completion.
    assert_eq!(model.calls(), 6);
}

#[tokio::test]
async fn wrong_method_returns_json_405() {
    let app = router(AppState::new(Arc::new(FixedAnswer("unused"))));

    for (method, uri) in [(Method::GET, "/research"), (Method::POST, "/")] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(json_body(response).await["detail"], "Method Not Allowed");
    }
}

#[tokio::test]
async fn provider_transport_failure_does_not_leak_the_api_key() {
    let key = "SUPER-SECRET-KEY";
    let model = Arc::new(
        GeminiClient::from_config(&ModelConfig {
            api_key: Some(key.into()),
            endpoint: Some("http://127.0.0.1:1/v1beta".into()),
            timeout_secs: 5,
            ..ModelConfig::default()
        })
        .unwrap(),
    );
    let tools = research_toolkit(Arc::clone(&model) as Arc<dyn LanguageModel>);
    let app = router(AppState::new(Arc::new(Agent::new(model, tools))));

    let response = app
        .oneshot(research_request(r#"{"query":"anything"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"].to_string();
    assert!(detail.contains("Gemini request error"), "{detail}");
    assert!(!detail.contains(key), "{detail}");
}
