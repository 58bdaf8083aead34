//! Health API

use axum::{Json, Router, extract::State, routing::get};

use crate::core::ServerState;
use shared::error::{AppResponse, ok};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<ServerState>) -> Json<AppResponse<serde_json::Value>> {
    ok(serde_json::json!({
        "status": "ok",
        "epoch": state.epoch,
    }))
}
