//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness and instance epoch
//! - [`cart`] - the buyer's cart lines
//! - [`checkout`] - cart-to-orders conversion
//! - [`orders`] - listing, detail and lifecycle transitions
//! - [`payments`] - the gateway callback entrypoint

pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod payments;

// Re-export common types for handlers
pub use shared::error::{AppResponse, AppResult};
