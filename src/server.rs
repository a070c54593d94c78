//! HTTP search API.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::error::{Error, ErrorKind};
use crate::search::{GenerationContext, ReadyState, SearchResult, Searcher};

#[derive(Clone)]
pub struct AppState {
    searcher: Arc<Searcher>,
    default_k: usize,
}

impl AppState {
    pub fn new(searcher: Arc<Searcher>, default_k: usize) -> Self {
        Self {
            searcher,
            default_k: default_k.max(1),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyBody {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidQuery => StatusCode::BAD_REQUEST,
            ErrorKind::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(kind = %self.0.kind(), error = %self.0, "search request failed");
        }
        let body = ErrorBody {
            error: self.0.kind().as_str().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/search", post(search_handler))
        .route("/context", post(context_handler))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    match state.searcher.store().snapshot() {
        Some(snapshot) => (
            StatusCode::OK,
            Json(ReadyBody {
                state: ReadyState::Ready.as_str().to_string(),
                chunks: Some(snapshot.len()),
                model: Some(snapshot.manifest().model.clone()),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                state: ReadyState::NotReady.as_str().to_string(),
                chunks: None,
                model: None,
            }),
        ),
    }
}

async fn search_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload.map_err(reject_body)?;
    let k = request.k.unwrap_or(state.default_k);
    let start = Instant::now();
    let results = state.searcher.search(&request.query, k).await?;
    info!(
        k,
        hits = results.len(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "served search"
    );
    Ok(Json(SearchResponse { results }))
}

async fn context_handler(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<GenerationContext>, ApiError> {
    let Json(request) = payload.map_err(reject_body)?;
    let k = request.k.unwrap_or(state.default_k);
    Ok(Json(state.searcher.context(&request.query, k).await?))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError(Error::InvalidQuery(rejection.body_text()))
}
