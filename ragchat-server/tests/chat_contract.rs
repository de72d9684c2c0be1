use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use ragchat_core::{
    ChatPipeline, Document, PipelineConfig, ProviderRegistry, ResolvedRoles, ResolverConfig,
    Retriever, RoleError, RoleResult,
};
use ragchat_server::{AppState, app_router};
use serde_json::{Value, json};

async fn spawn_server(pipeline: ChatPipeline) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

fn fallback_pipeline(results_path: PathBuf) -> ChatPipeline {
    let config = PipelineConfig::builder().results_path(results_path).build().unwrap();
    ChatPipeline::new(ResolvedRoles::fallbacks(), config)
}

#[tokio::test]
async fn chat_returns_answer_and_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");
    let (base, handle) = spawn_server(fallback_pipeline(results.clone())).await;

    let response = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({"message": "What is RAG?", "metadata": {"tags": ["unit"]}}))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.expect("chat json");
    let answer = body["answer"].as_str().expect("answer field");
    assert!(!answer.is_empty());
    assert_eq!(body["message"]["content"], body["answer"]);
    assert_eq!(body["metadata"]["source"], "single_file_pipeline");
    assert_eq!(body["metadata"]["tags"], json!(["unit"]));
    assert!(body["metadata"]["latency_ms"].is_u64());
    assert_eq!(body["eval_results"]["faithfulness"], json!(0.8));

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&results).unwrap()).unwrap();
    assert_eq!(written, body["eval_results"]);

    handle.abort();
}

#[tokio::test]
async fn blank_or_missing_message_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");
    let (base, handle) = spawn_server(fallback_pipeline(results.clone())).await;
    let client = reqwest::Client::new();

    let bodies = [
        Some(json!({"message": ""})),
        Some(json!({"message": "   \t"})),
        Some(json!({"metadata": {"tags": ["x"]}})),
        Some(json!({"message": null})),
        None,
    ];
    for body in bodies {
        let mut request = client.post(format!("{}/chat", base));
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request.send().await.expect("chat response");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "body: {body:?}");
        let error: Value = response.json().await.expect("error json");
        assert_eq!(error, json!({"error": "message is required"}));
    }

    let garbage = client
        .post(format!("{}/chat", base))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .expect("chat response");
    assert_eq!(garbage.status(), reqwest::StatusCode::BAD_REQUEST);

    assert!(!results.exists());
    handle.abort();
}

#[tokio::test]
async fn malformed_metadata_does_not_hide_message() {
    let dir = tempfile::tempdir().unwrap();
    let (base, handle) = spawn_server(fallback_pipeline(dir.path().join("results.json"))).await;
    let client = reqwest::Client::new();

    let bodies = [
        json!({"message": "What is RAG?", "metadata": {"tags": null}}),
        json!({"message": "What is RAG?", "metadata": "x"}),
        json!({"message": "What is RAG?", "metadata": {"tags": ["ok", 7]}}),
    ];
    for body in bodies {
        let response = client
            .post(format!("{}/chat", base))
            .json(&body)
            .send()
            .await
            .expect("chat response");
        assert_eq!(response.status(), reqwest::StatusCode::OK, "body: {body}");
        let reply: Value = response.json().await.expect("chat json");
        assert!(!reply["answer"].as_str().unwrap_or_default().is_empty());
        assert!(reply["metadata"]["tags"].is_array());
    }

    handle.abort();
}

struct Unreachable;

#[async_trait]
impl Retriever for Unreachable {
    async fn retrieve(&self, _query: &str, top_k: Option<usize>) -> RoleResult<Vec<Document>> {
        match top_k {
            Some(_) => Err(RoleError::TopKUnsupported),
            None => Err(RoleError::failed("unreachable", "connection refused")),
        }
    }
}

#[tokio::test]
async fn stage_failure_is_reported_as_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = ProviderRegistry::new();
    registry.register_retriever("rag", "retrieve", Arc::new(Unreachable));
    let roles = ResolvedRoles::resolve(&registry, &ResolverConfig::default());
    let config =
        PipelineConfig::builder().results_path(dir.path().join("results.json")).build().unwrap();
    let (base, handle) = spawn_server(ChatPipeline::new(roles, config)).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/chat", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .expect("chat response");
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = response.json().await.expect("error json");
    assert!(error["error"].as_str().unwrap().contains("retriever stage failed"));

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("health response")
        .json()
        .await
        .expect("health json");
    assert_eq!(health["roles"]["retriever"], "rag.retrieve");
    assert_eq!(health["roles"]["generator"], "fallback");

    handle.abort();
}
