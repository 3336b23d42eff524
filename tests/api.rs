mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};

use common::{app, json_request, send, upload_request, BrokenGenerator};
use convo_rag::llm::Generator;
use convo_rag::rag::{QueryInput, QueryResult};

fn two_hits() -> QueryResult {
    serde_json::from_value(json!({
        "ids": [["a", "b"]],
        "documents": [["first passage", "second passage"]],
        "metadatas": [[{"source": "upload"}, null]],
        "distances": [[0.1, 0.4]]
    }))
    .unwrap()
}

#[tokio::test]
async fn health_reports_wiring() {
    let test_app = app(QueryResult::default(), None);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["generator_configured"], false);
    assert_eq!(body["ingest_backend"], "engine");
}

#[tokio::test]
async fn answer_without_generator_uses_context() {
    let test_app = app(two_hits(), None);
    let request = json_request(
        "POST",
        "/chat/answer",
        json!({"collection": "conversations", "question": "what happened?", "top_k": 2}),
    );

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("Context-based answer (beta):\n"));
    assert!(answer.contains("first passage\n---\nsecond passage"));
    assert_eq!(body["contexts"].as_array().unwrap().len(), 2);
    assert_eq!(body["contexts"][0]["id"], "a");
    assert_eq!(body["contexts"][1]["metadata"], Value::Null);

    let queries = test_app.store.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].n_results, 2);
    assert!(matches!(&queries[0].input, QueryInput::Embeddings(e) if e.len() == 1));
}

#[tokio::test]
async fn answer_with_failing_generator_falls_back() {
    let generator: Arc<dyn Generator> = Arc::new(BrokenGenerator);
    let test_app = app(two_hits(), Some(generator));
    let request = json_request(
        "POST",
        "/chat/answer",
        json!({"collection": "conversations", "question": "what happened?"}),
    );

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"]
        .as_str()
        .unwrap()
        .starts_with("Context-based answer (beta):"));
}

#[tokio::test]
async fn answer_without_hits_returns_sentinel() {
    let test_app = app(QueryResult::default(), None);
    let request = json_request(
        "POST",
        "/chat/answer",
        json!({"collection": "conversations", "question": "anything?"}),
    );

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "No relevant documents were found.");
    assert_eq!(body["contexts"], json!([]));
    assert_eq!(test_app.store.queries.lock().unwrap()[0].n_results, 5);
}

#[tokio::test]
async fn answer_requires_question() {
    let test_app = app(QueryResult::default(), None);
    let request = json_request(
        "POST",
        "/chat/answer",
        json!({"collection": "conversations", "question": "   "}),
    );

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "question is required");
}

#[tokio::test]
async fn ingest_requires_messages() {
    let test_app = app(QueryResult::default(), None);
    let request = json_request("POST", "/rag/ingest", json!({"messages": []}));

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "messages[] is required");
    assert!(test_app.ingestor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ingest_keeps_scalar_metadata() {
    let test_app = app(QueryResult::default(), None);
    let request = json_request(
        "POST",
        "/rag/ingest",
        json!({
            "messages": ["hi", "hello"],
            "metadata": {"user": "kim", "turns": 2, "nested": {"x": 1}}
        }),
    );

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "conv-1");
    assert_eq!(body["vector_dim"], 3);

    let calls = test_app.ingestor.calls.lock().unwrap();
    assert_eq!(calls[0].0, vec!["hi".to_string(), "hello".to_string()]);
    assert_eq!(calls[0].1.get("user"), Some(&json!("kim")));
    assert!(calls[0].1.get("nested").is_none());
}

#[tokio::test]
async fn batch_upload_ingests_each_line_in_order() {
    let test_app = app(QueryResult::default(), None);
    let contents = "[\"a\",\"b\"]\n\n{\"messages\":[\"c\"]}\n{\"q\":\"why?\",\"a\":\"because\"}\n";

    let (status, body) = send(&test_app.router, upload_request("chats.jsonl", contents)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["items"][0]["id"], "conv-1");
    assert_eq!(body["items"][2]["id"], "conv-3");

    let calls = test_app.ingestor.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[2].0,
        vec!["Q: why?".to_string(), "A: because".to_string()]
    );
    assert_eq!(calls[0].1.get("source"), Some(&json!("upload")));
}

#[tokio::test]
async fn batch_upload_rejects_unknown_extension() {
    let test_app = app(QueryResult::default(), None);

    let (status, body) = send(&test_app.router, upload_request("chats.csv", "a,b")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("csv"));
    assert!(test_app.ingestor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn batch_upload_reports_bad_line() {
    let test_app = app(QueryResult::default(), None);

    let (status, body) = send(
        &test_app.router,
        upload_request("chats.jsonl", "[\"ok\"]\n{\"nope\": 1}\n"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("line 2"));
    assert!(test_app.ingestor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn batch_upload_requires_file_field() {
    let test_app = app(QueryResult::default(), None);
    let boundary = "convo-rag-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/rag/ingest-batch")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "file is required");
}

#[tokio::test]
async fn batch_upload_rejects_empty_file() {
    let test_app = app(QueryResult::default(), None);

    let (status, body) = send(&test_app.router, upload_request("chats.jsonl", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "file is empty");
    assert!(test_app.ingestor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn record_listing_trims_comma_separated_include() {
    let test_app = app(QueryResult::default(), None);
    let request = Request::builder()
        .uri("/chroma/collections/conversations?limit=7&include=documents,%20distances,uris")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let gets = test_app.store.gets.lock().unwrap();
    assert_eq!(gets[0].0, "conversations");
    assert_eq!(gets[0].1, 7);
    assert_eq!(gets[0].2.as_wire(), vec!["documents", "distances"]);
}

#[tokio::test]
async fn record_listing_defaults_include() {
    let test_app = app(QueryResult::default(), None);
    let request = Request::builder()
        .uri("/chroma/collections/conversations")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let gets = test_app.store.gets.lock().unwrap();
    assert_eq!(gets[0].1, 20);
    assert_eq!(gets[0].2.as_wire(), vec!["documents", "metadatas"]);
}

#[tokio::test]
async fn missing_collection_maps_to_not_found() {
    let test_app = app(QueryResult::default(), None);
    let request = Request::builder()
        .uri("/chroma/collections/missing?limit=5")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn collection_query_requires_input() {
    let test_app = app(QueryResult::default(), None);
    let request = json_request(
        "POST",
        "/chroma/collections/conversations/query",
        json!({"nResults": 3}),
    );

    let (status, _) = send(&test_app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
