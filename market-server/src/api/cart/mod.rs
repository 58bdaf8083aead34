//! Cart API

mod handler;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/cart", get(handler::list).post(handler::add))
        .route("/api/cart/{id}", delete(handler::remove))
}
