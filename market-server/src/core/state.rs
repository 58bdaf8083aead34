//! Server state
//!
//! Shared references held by every request handler. Cheap to clone; the
//! pool and services are all handle types.

use std::sync::Arc;

use crate::auth::JwtService;
use crate::checkout::CheckoutService;
use crate::core::Config;
use crate::db::DbService;
use crate::notify::Notifier;
use crate::orders::OrderService;
use crate::payments::{GatewayRegistry, PaymentReconciler};
use shared::error::AppResult;
use sqlx::SqlitePool;

#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub notifier: Notifier,
    pub jwt: Arc<JwtService>,
    pub gateways: Arc<GatewayRegistry>,
    /// Unique per-process id; clients use it to detect restarts
    pub epoch: String,
}

impl ServerState {
    /// Open the configured database and build the state
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_pool(config.clone(), db.pool))
    }

    /// Build state over an existing pool (tests use the in-memory pool)
    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "Server state initialized");
        Self {
            jwt: Arc::new(JwtService::new(config.jwt.clone())),
            gateways: Arc::new(GatewayRegistry::with_sandbox()),
            notifier: Notifier::new(),
            config,
            pool,
            epoch,
        }
    }

    pub fn checkout_service(&self) -> CheckoutService {
        CheckoutService::new(self.pool.clone(), self.notifier.clone())
    }

    pub fn order_service(&self) -> OrderService {
        OrderService::new(self.pool.clone(), self.notifier.clone())
    }

    pub fn reconciler(&self) -> PaymentReconciler {
        PaymentReconciler::new(self.pool.clone(), self.notifier.clone())
    }
}
