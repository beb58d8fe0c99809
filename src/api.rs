use shuttle_axum::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::monitor::{Monitor, MonitorSnapshot};
use crate::tweet::Tweet;

#[derive(Clone)]
pub struct AppState {
    pub monitor: Monitor,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/status", get(status))
        .route("/api/monitor/start", post(start_monitor))
        .route("/api/monitor/stop", post(stop_monitor))
        .route("/api/tweets", get(list_tweets))
        .route("/api/tweets/{id}/post", post(simulate_post))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn status(State(state): State<AppState>) -> Json<MonitorSnapshot> {
    Json(state.monitor.snapshot())
}

#[derive(serde::Deserialize)]
struct StartReq {
    topic: String,
}

async fn start_monitor(
    State(state): State<AppState>,
    Json(body): Json<StartReq>,
) -> impl IntoResponse {
    match state.monitor.start(&body.topic) {
        Ok(()) => (StatusCode::OK, Json(state.monitor.snapshot())).into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn stop_monitor(State(state): State<AppState>) -> Json<MonitorSnapshot> {
    state.monitor.stop();
    Json(state.monitor.snapshot())
}

/// Tweets newest-first, as the feed renders them.
async fn list_tweets(State(state): State<AppState>) -> Json<Vec<Tweet>> {
    Json(state.monitor.tweets())
}

/// Posting is a simulation: nothing leaves this process.
async fn simulate_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.monitor.tweet(&id) {
        Some(tweet) => {
            tracing::info!(id = %tweet.id, "simulated post, nothing was sent");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "simulated": true, "id": tweet.id })),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
