use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::search::{IndexView, Page, SearchResult};
use crate::sync::{ConsumerState, SyncStats};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Ready once every sync consumer is running
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let stopped: Vec<&str> = state
        .consumers
        .iter()
        .filter(|c| matches!(c.state(), ConsumerState::Idle | ConsumerState::Stopped))
        .map(|c| c.topic())
        .collect();

    if !stopped.is_empty() {
        return Err(AppError::Unavailable(format!(
            "sync consumers not running: {}",
            stopped.join(", ")
        )));
    }

    health_check(State(state)).await
}

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        buffer = b"# Error encoding metrics\n".to_vec();
    }

    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer)
}

/// Query string of both search endpoints
#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    /// Search expression, `biz:<target>:<keywords>`
    #[validate(length(min = 1, max = 1024))]
    pub q: String,
    /// Bounded by the default result window; the engine checks `offset + limit`
    #[validate(range(max = 10000))]
    pub offset: Option<usize>,
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

/// Search the published indices
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>> {
    run_search(&state, IndexView::Published, params).await
}

/// Search the admin indices, drafts included
pub async fn admin_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>> {
    run_search(&state, IndexView::Admin, params).await
}

async fn run_search(
    state: &AppState,
    view: IndexView,
    params: SearchParams,
) -> Result<Json<SearchResult>> {
    params.validate()?;

    let engine = state.engine(view);
    let default = engine.default_page();
    let page = Page::new(
        params.offset.unwrap_or(default.offset),
        params.limit.unwrap_or(default.limit),
    );

    let result = engine.search_page(&params.q, page).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct ConsumerStatus {
    pub topic: String,
    pub state: ConsumerState,
    pub stats: SyncStats,
}

/// State and counters of each sync consumer
pub async fn sync_status(State(state): State<AppState>) -> Json<Vec<ConsumerStatus>> {
    Json(
        state
            .consumers
            .iter()
            .map(|c| ConsumerStatus {
                topic: c.topic().to_string(),
                state: c.state(),
                stats: c.stats(),
            })
            .collect(),
    )
}
