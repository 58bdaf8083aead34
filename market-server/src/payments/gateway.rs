//! Gateway seam
//!
//! Per-gateway request formats and signature schemes stay behind
//! [`GatewayVerifier`]; the reconciler only ever sees authenticated
//! [`GatewayCallback`] payloads.

use async_trait::async_trait;
use serde::Deserialize;
use shared::error::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Normalized payment notification
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCallback {
    /// Buyer-facing order code the gateway echoes back
    pub order_code: String,
    /// The gateway's external transaction code
    pub transaction_code: String,
    pub success: bool,
    pub amount: Option<f64>,
    pub error_message: Option<String>,
}

/// Authenticity check for one gateway
#[async_trait]
pub trait GatewayVerifier: Send + Sync {
    fn gateway_id(&self) -> &str;

    /// Verify the payload really came from this gateway
    async fn verify(&self, callback: &GatewayCallback) -> AppResult<()>;
}

/// Accepts every payload; development and test environments only
pub struct SandboxVerifier;

#[async_trait]
impl GatewayVerifier for SandboxVerifier {
    fn gateway_id(&self) -> &str {
        "sandbox"
    }

    async fn verify(&self, _callback: &GatewayCallback) -> AppResult<()> {
        Ok(())
    }
}

/// Registered gateways, looked up by the callback URL's gateway segment
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    verifiers: HashMap<String, Arc<dyn GatewayVerifier>>,
}

impl std::fmt::Debug for GatewayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRegistry")
            .field("gateways", &self.verifiers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the sandbox gateway preinstalled
    pub fn with_sandbox() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SandboxVerifier));
        registry
    }

    pub fn register(&mut self, verifier: Arc<dyn GatewayVerifier>) {
        self.verifiers
            .insert(verifier.gateway_id().to_string(), verifier);
    }

    /// Resolve a gateway or fail `NotFound`
    pub fn get(&self, gateway_id: &str) -> AppResult<Arc<dyn GatewayVerifier>> {
        self.verifiers
            .get(gateway_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Gateway {gateway_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = GatewayRegistry::with_sandbox();
        assert!(registry.get("sandbox").is_ok());
        assert!(matches!(
            registry.get("vanished-pay"),
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sandbox_accepts_everything() {
        let verifier = SandboxVerifier;
        let cb = GatewayCallback {
            order_code: "ORD250101-0001".to_string(),
            transaction_code: "TXN-1".to_string(),
            success: true,
            amount: None,
            error_message: None,
        };
        assert!(verifier.verify(&cb).await.is_ok());
    }
}
