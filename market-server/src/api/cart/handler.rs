//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{cart as cart_repo, product as product_repo};
use crate::utils::money;
use shared::error::{AppError, AppResponse, AppResult, ok};
use shared::models::{CartLine, CartLineCreate};

/// List the caller's cart lines
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<CartLine>>>> {
    let lines = cart_repo::list_by_buyer(&state.pool, user.id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(lines))
}

/// Add a line, merging quantities for the same product
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartLineCreate>,
) -> AppResult<Json<AppResponse<CartLine>>> {
    money::validate_quantity(payload.quantity)?;

    let product = product_repo::find_by_id(&state.pool, payload.product_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(format!("Product {}", payload.product_id)))?;
    if !product.is_sellable() {
        return Err(AppError::invalid(format!(
            "Product {} is not available for sale",
            product.name
        )));
    }

    let line = cart_repo::add_line(&state.pool, user.id, payload.product_id, payload.quantity)
        .await
        .map_err(AppError::from)?;
    Ok(ok(line))
}

/// Remove one of the caller's cart lines
pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    let removed = cart_repo::remove_line(&state.pool, user.id, id)
        .await
        .map_err(AppError::from)?;
    if !removed {
        return Err(AppError::not_found(format!("Cart line {id}")));
    }
    Ok(ok(()))
}
