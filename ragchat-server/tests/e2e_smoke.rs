//! End-to-end smoke check: one chat round trip against the fallback roles,
//! then threshold checks on the evaluation results file.

use std::collections::BTreeMap;

use ragchat_core::{ChatPipeline, PipelineConfig, ProviderRegistry, ResolvedRoles, ResolverConfig};
use ragchat_server::{AppState, app_router};
use serde_json::{Value, json};

const DEFAULT_THRESHOLDS: &str = r#"{"overall.score":0.6,"faithfulness":0.7}"#;

/// Pulls the answer text out of a chat-shaped response.
fn response_text(body: &Value) -> Option<String> {
    let non_blank = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    ["answer", "content"]
        .iter()
        .find_map(|key| body.get(*key).and_then(non_blank))
        .or_else(|| body.pointer("/message/content").and_then(non_blank))
        .or_else(|| body.as_object()?.values().find_map(non_blank))
}

/// Numeric leaves of `value` keyed by their dotted path.
fn flatten(value: &Value, prefix: &str, out: &mut BTreeMap<String, f64>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten(child, &path, out);
            }
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                out.insert(prefix.to_string(), f);
            }
        }
        _ => {}
    }
}

#[tokio::test]
async fn smoke_round_trip_meets_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");

    // Override pointing at a module nobody registered: must fall back quietly.
    let resolver = ResolverConfig::from_lookup(|key| {
        (key == "RAG_RETRIEVER_MODULE").then(|| "missing_rag_module".to_string())
    });
    let roles = ResolvedRoles::resolve(&ProviderRegistry::new(), &resolver);
    let config = PipelineConfig::builder().results_path(&results).build().unwrap();
    let app = app_router(AppState::new(ChatPipeline::new(roles, config)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&json!({
            "message": "Wire chatbot → rag-system → llm-agent using prompt layer. One sentence summary.",
            "metadata": {"source": "e2e_smoke_test", "tags": ["e2e", "smoke"]},
            "stream": false
        }))
        .send()
        .await
        .expect("chat response");
    assert!(response.status().is_success(), "chat failed: {}", response.status());

    let body: Value = response.json().await.expect("chat json");
    let text = response_text(&body).expect("no text in response");
    assert!(!text.is_empty());
    assert_eq!(body["metadata"]["tags"], json!(["e2e", "smoke"]));

    let raw = std::fs::read_to_string(&results).expect("results file written");
    let parsed: Value = serde_json::from_str(&raw).expect("results json");
    let mut flat = BTreeMap::new();
    flatten(&parsed, "", &mut flat);

    let thresholds: BTreeMap<String, f64> = serde_json::from_str(DEFAULT_THRESHOLDS).unwrap();
    let missing: Vec<&String> = thresholds.keys().filter(|k| !flat.contains_key(*k)).collect();
    assert!(missing.is_empty(), "missing metrics {missing:?}, have {:?}", flat.keys());

    let failures: Vec<String> = thresholds
        .iter()
        .filter(|(k, thr)| flat[*k] < **thr)
        .map(|(k, thr)| format!("{k}: {:.4} < {thr:.4}", flat[k]))
        .collect();
    assert!(failures.is_empty(), "thresholds not met: {}", failures.join(", "));

    handle.abort();
}
