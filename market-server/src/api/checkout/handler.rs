//! Checkout API Handler

use axum::{Json, extract::State};

use crate::auth::CurrentUser;
use crate::checkout::{CheckoutOutcome, CheckoutRequest};
use crate::core::ServerState;
use shared::error::{AppResponse, AppResult, ok};

/// Convert the caller's cart into per-seller orders
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<CheckoutOutcome>>> {
    let outcome = state.checkout_service().checkout(&user, &payload).await?;
    Ok(ok(outcome))
}
