//! Payment callback handler
//!
//! No bearer auth here: gateways authenticate through their verifier. The
//! handler answers quickly either way; a typed error body is still a
//! delivered response from the gateway's point of view.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::payments::GatewayCallback;
use shared::error::{AppResponse, AppResult, ok_with_message};

/// Receive one asynchronous payment notification
pub async fn gateway_callback(
    State(state): State<ServerState>,
    Path(gateway): Path<String>,
    Json(payload): Json<GatewayCallback>,
) -> AppResult<Json<AppResponse<serde_json::Value>>> {
    let verifier = state.gateways.get(&gateway)?;
    verifier.verify(&payload).await?;

    let outcome = state.reconciler().handle_callback(&gateway, &payload).await?;
    Ok(ok_with_message(
        serde_json::json!({ "outcome": outcome }),
        "received",
    ))
}
