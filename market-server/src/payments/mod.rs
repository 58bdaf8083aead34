//! Payments
//!
//! Gateway-agnostic callback handling: the verifier seam hides per-gateway
//! signature schemes, the reconciler applies each authentic callback to a
//! Payment exactly once.

pub mod gateway;
pub mod reconciler;

pub use gateway::{GatewayCallback, GatewayRegistry, GatewayVerifier, SandboxVerifier};
pub use reconciler::{PaymentReconciler, ReconcileOutcome};
