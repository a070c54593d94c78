#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use temis_retriever::search::{Embedder, EmbeddingClient, SourceDocument};
use temis_retriever::{Error, Result};

pub const DIMENSIONS: usize = 16;

/// Bag-of-words vector: each lowercase word bumps one hashed bucket.
/// Identical texts map to identical vectors.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u32 = 2166136261;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(16777619);
        }
        vector[hash as usize % DIMENSIONS] += 1.0;
    }
    vector
}

pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub dimensions: usize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            dimensions: DIMENSIONS,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = keyword_vector(t);
                v.resize(self.dimensions, 0.0);
                v
            })
            .collect())
    }

    fn model(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Always fails as if the provider were offline.
pub struct OfflineEmbedder;

#[async_trait]
impl Embedder for OfflineEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::ProviderUnavailable("connection refused".to_string()))
    }

    fn model(&self) -> &str {
        "offline"
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    async fn health_check(&self) -> Result<()> {
        Err(Error::ProviderUnavailable("connection refused".to_string()))
    }
}

pub fn keyword_client() -> (Arc<KeywordEmbedder>, EmbeddingClient) {
    let embedder = Arc::new(KeywordEmbedder::new());
    let client = EmbeddingClient::new(embedder.clone(), 4, 2);
    (embedder, client)
}

pub fn corpus() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new(
            "estatuto.txt",
            "Artigo 5: uso indevido de cartão corporativo\x0c\
             Artigo 6: faltas sem aviso prévio geram advertência",
        ),
        SourceDocument::new(
            "regimento.md",
            "Os diretores devem prestar contas mensalmente ao conselho",
        ),
        SourceDocument::new(
            "codigo.txt",
            "Conflito de interesses deve ser declarado antes da votação",
        ),
    ]
}

/// How the fake provider answers `/api/embed`.
#[derive(Clone, Copy)]
pub enum ProviderMode {
    Healthy,
    MissingField,
    DropOne,
    ServerError,
}

#[derive(Clone)]
struct FakeProvider {
    mode: ProviderMode,
    requests: Arc<AtomicUsize>,
}

pub struct FakeOllama {
    pub url: String,
    pub requests: Arc<AtomicUsize>,
}

/// Starts an Ollama look-alike on an ephemeral port.
pub async fn spawn_fake_ollama(mode: ProviderMode) -> FakeOllama {
    let requests = Arc::new(AtomicUsize::new(0));
    let state = FakeProvider {
        mode,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/api/embed", post(fake_embed))
        .route("/api/tags", get(fake_tags))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeOllama {
        url: format!("http://{addr}"),
        requests,
    }
}

async fn fake_embed(
    State(state): State<FakeProvider>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let inputs: Vec<String> = match &body["input"] {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    match state.mode {
        ProviderMode::Healthy => {
            let embeddings: Vec<Vec<f32>> = inputs.iter().map(|t| keyword_vector(t)).collect();
            (StatusCode::OK, Json(json!({ "embeddings": embeddings })))
        }
        ProviderMode::MissingField => (StatusCode::OK, Json(json!({ "model": "x" }))),
        ProviderMode::DropOne => {
            let mut embeddings: Vec<Vec<f32>> =
                inputs.iter().map(|t| keyword_vector(t)).collect();
            embeddings.pop();
            (StatusCode::OK, Json(json!({ "embeddings": embeddings })))
        }
        ProviderMode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "model crashed" })),
        ),
    }
}

async fn fake_tags() -> Json<Value> {
    Json(json!({ "models": [ { "name": "nomic-embed-text:latest" } ] }))
}
