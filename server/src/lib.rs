use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use boolsearch_core::engine::SearchEngine;
use boolsearch_core::index::IndexingStats;
use boolsearch_core::Document;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Required in `X-ADMIN-TOKEN` for `/index/rebuild`. Rebuilds are refused when unset.
    pub admin_token: Option<String>,
    /// Comma-separated allowed origins; any origin when unset or empty.
    pub cors_allow_origin: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub status: &'static str,
    pub count: usize,
    pub documents: Vec<Document>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub status: &'static str,
    pub docs_count: u64,
    pub total_bytes: u64,
    pub total_bytes_kb: f64,
    pub total_tokens: u64,
    pub avg_token_length: f64,
    pub indexing_time_seconds: f64,
    pub indexing_speed_kb_per_sec: f64,
    pub top_frequencies: Vec<RankedFrequency>,
}

#[derive(Serialize)]
pub struct RankedFrequency {
    pub rank: usize,
    pub frequency: u64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(code: StatusCode, message: impl Into<String>) -> ApiError {
    (code, Json(ErrorResponse { status: "error", message: message.into() }))
}

impl From<&IndexingStats> for StatsResponse {
    fn from(stats: &IndexingStats) -> Self {
        Self {
            status: "success",
            docs_count: stats.docs_count,
            total_bytes: stats.total_bytes,
            total_bytes_kb: stats.total_bytes_kb(),
            total_tokens: stats.total_tokens,
            avg_token_length: stats.avg_token_length(),
            indexing_time_seconds: stats.elapsed_seconds,
            indexing_speed_kb_per_sec: stats.indexing_speed_kb_per_sec(),
            top_frequencies: stats
                .top_frequencies
                .iter()
                .enumerate()
                .map(|(i, &frequency)| RankedFrequency { rank: i + 1, frequency })
                .collect(),
        }
    }
}

pub fn build_app(engine: Arc<SearchEngine>, config: AppConfig) -> Router {
    let state = AppState { engine, admin_token: config.admin_token };

    let cors = match config.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/stats", get(stats_handler))
        .route("/search", post(search_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(&state.engine.stats()))
}

/// The body is parsed by hand so that any malformed payload, whatever its
/// content type, gets the same 400 response.
pub async fn search_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<SearchResponse>, ApiError> {
    let request: SearchRequest = serde_json::from_slice(&body)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid JSON or missing 'query' field"))?;

    let start = std::time::Instant::now();
    let engine = state.engine.clone();
    let query = request.query.clone();
    let (count, documents) = tokio::task::spawn_blocking(move || {
        let ids = engine.search(&query);
        (ids.len(), engine.fetch_documents(&ids))
    })
    .await
    .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("search task failed: {err}")))?;
    tracing::info!(
        query = %request.query,
        hits = count,
        returned = documents.len(),
        took_ms = start.elapsed().as_millis() as u64,
        "search"
    );
    Ok(Json(SearchResponse { status: "success", count, documents }))
}

pub async fn rebuild_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, ApiError> {
    authorize(&state, &headers)?;
    let engine = state.engine.clone();
    let stats = tokio::task::spawn_blocking(move || engine.build_index())
        .await
        .map_err(|err| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild task failed: {err}")))?
        .map_err(|err| {
            tracing::error!(error = %err, "index rebuild failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Indexing error: {err:#}"))
        })?;
    Ok(Json(StatsResponse::from(&stats)))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(api_error(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(api_error(StatusCode::UNAUTHORIZED, "invalid admin token"))
    }
}
