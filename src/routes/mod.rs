//! API routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::app::AppEvent;
use crate::core::{request_completion, ChatError, PendingExchange};
use crate::render::PageView;
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            ChatError::Busy => StatusCode::CONFLICT,
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn page(State(state): State<AppState>) -> Json<PageView> {
    Json(state.storefront.lock().await.render())
}

async fn event(
    State(state): State<AppState>,
    Json(event): Json<AppEvent>,
) -> Json<PageView> {
    if matches!(event, AppEvent::Search { .. } | AppEvent::ClearSearch) {
        // an explicit search supersedes any keystrokes still waiting out the delay
        state.search.cancel().await;
    }
    let mut storefront = state.storefront.lock().await;
    storefront.apply(event).await;
    Json(storefront.render())
}

/// Search-as-you-type: the view is recomputed once typing pauses
async fn search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> StatusCode {
    let storefront = state.storefront.clone();
    state
        .search
        .schedule(async move {
            storefront
                .lock()
                .await
                .apply(AppEvent::Search { term: request.term })
                .await;
        })
        .await;
    StatusCode::ACCEPTED
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<PageView>, ChatError> {
    let exchange = state.storefront.lock().await.begin_chat(&request.message)?;
    Ok(Json(complete(&state, exchange).await))
}

async fn routine(State(state): State<AppState>) -> Result<Json<PageView>, ChatError> {
    let started = state.storefront.lock().await.begin_routine()?;
    match started {
        Some(exchange) => Ok(Json(complete(&state, exchange).await)),
        None => Ok(Json(state.storefront.lock().await.render())),
    }
}

async fn reset_chat(State(state): State<AppState>) -> Json<PageView> {
    let mut storefront = state.storefront.lock().await;
    storefront.apply(AppEvent::ResetChat).await;
    Json(storefront.render())
}

/// Send without holding the state lock, then record the reply.
///
/// The exchange runs on its own task so it is finished even if the caller
/// disconnects while the request is in flight.
async fn complete(state: &AppState, exchange: PendingExchange) -> PageView {
    let client = state.client.clone();
    let storefront = state.storefront.clone();
    let exchange_task = tokio::spawn(async move {
        let reply = request_completion(client.as_ref(), &exchange).await;
        let outcome = storefront.lock().await.finish_chat(exchange, reply);
        tracing::debug!("Exchange finished: {:?}", outcome);
    });

    if let Err(e) = exchange_task.await {
        tracing::error!("Exchange task failed: {}", e);
    }
    state.storefront.lock().await.render()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/page", get(page))
        .route("/api/events", post(event))
        .route("/api/search", post(search))
        .route("/api/chat", post(chat))
        .route("/api/chat/reset", post(reset_chat))
        .route("/api/routine", post(routine))
}
