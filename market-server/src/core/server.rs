//! HTTP server assembly

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api;
use crate::core::{Config, ServerState};
use shared::error::{AppError, AppResult};

pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Compose the full application router
    pub fn router(state: ServerState) -> Router {
        Router::new()
            .merge(api::health::router())
            .merge(api::cart::router())
            .merge(api::checkout::router())
            .merge(api::orders::router())
            .merge(api::payments::router())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
            .with_state(state)
    }

    /// Bind and serve until the process exits
    pub async fn run(self) -> AppResult<()> {
        let addr = format!("0.0.0.0:{}", self.config.http_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))
    }
}
