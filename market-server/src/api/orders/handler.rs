//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use shared::error::{AppResponse, AppResult, ok};
use shared::models::{Order, OrderDetail, OrderStatus};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List orders: buyers see purchases, sellers see sales, admins see all
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let orders = state
        .order_service()
        .list(&user, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;
    Ok(ok(orders))
}

/// Full order detail (lines + payments)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = state.order_service().get_detail(&user, id).await?;
    Ok(ok(detail))
}

/// Status transition payload
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Move an order through its lifecycle
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .order_service()
        .update_status(&user, id, payload.status)
        .await?;
    Ok(ok(order))
}

/// Cancel an order (buyer or admin)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.order_service().cancel(&user, id).await?;
    Ok(ok(order))
}
