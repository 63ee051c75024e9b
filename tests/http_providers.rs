//! HTTP provider clients exercised against a mock server.

use httpmock::prelude::*;
use serde_json::json;

use contextsmith::embeddings::{EmbeddingProvider, OllamaEmbeddings};
use contextsmith::generation::{GenerationService, OllamaGenerator};
use contextsmith::retrieval::rerank::{RerankModel, TeiReranker};
use contextsmith::types::RetrievalError;

#[tokio::test]
async fn ollama_embeddings_posts_model_and_prompt() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/embeddings")
            .json_body(json!({"model": "nomic-embed-text", "prompt": "charging basics"}));
        then.status(200)
            .json_body(json!({"embedding": [0.25, -0.5, 0.75]}));
    });

    let provider = OllamaEmbeddings::new(&server.base_url(), "nomic-embed-text").unwrap();
    let vector = provider.embed("charging basics").await.unwrap();
    assert_eq!(vector, vec![0.25, -0.5, 0.75]);
    mock.assert();
}

#[tokio::test]
async fn ollama_embeddings_surfaces_http_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/embeddings");
        then.status(500).body("model not loaded");
    });

    let provider = OllamaEmbeddings::new(&server.base_url(), "nomic-embed-text").unwrap();
    let result = provider.embed_query("anything").await;
    assert!(matches!(result, Err(RetrievalError::Embedding(_))));
}

#[tokio::test]
async fn tei_reranker_restores_input_order_from_indexed_scores() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/rerank");
        // Endpoint answers sorted by score, not by input position.
        then.status(200).json_body(json!([
            {"index": 1, "score": 0.92},
            {"index": 0, "score": 0.13}
        ]));
    });

    let reranker = TeiReranker::new(&format!("{}/rerank", server.base_url())).unwrap();
    let scores = reranker
        .score(
            "how do I charge?",
            &["unrelated".to_string(), "charging guide".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(scores, vec![0.13, 0.92]);
    mock.assert();
}

#[tokio::test]
async fn tei_reranker_rejects_incomplete_coverage() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/rerank");
        then.status(200).json_body(json!([{"index": 0, "score": 0.5}]));
    });

    let reranker = TeiReranker::new(&format!("{}/rerank", server.base_url())).unwrap();
    let result = reranker
        .score("q", &["a".to_string(), "b".to_string()])
        .await;
    assert!(matches!(result, Err(RetrievalError::Rerank(_))));
}

#[tokio::test]
async fn ollama_generator_returns_the_response_field() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({
            "model": "qwen3:4b",
            "response": "Plug in the supplied cable.",
            "done": true
        }));
    });

    let generator = OllamaGenerator::new(&server.base_url(), "qwen3:4b").unwrap();
    let answer = generator.generate("prompt text").await.unwrap();
    assert_eq!(answer, "Plug in the supplied cable.");
    mock.assert();
}

#[tokio::test]
async fn ollama_generator_surfaces_http_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(404);
    });

    let generator = OllamaGenerator::new(&server.base_url(), "qwen3:4b").unwrap();
    let result = generator.generate("prompt text").await;
    assert!(matches!(result, Err(RetrievalError::Generation(_))));
}
