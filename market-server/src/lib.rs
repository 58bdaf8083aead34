//! Marketplace transactional core
//!
//! Converts a buyer's cart into per-seller orders, reconciles stock under
//! concurrent checkout pressure through optimistic versioning, computes
//! tiered wholesale / retail pricing with shipping and threshold discounts,
//! drives orders through a role-authorized lifecycle, and applies
//! asynchronous payment-gateway callbacks exactly once.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod stock;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};

/// Load .env and initialize logging from the environment
pub fn setup_environment() {
    dotenv::dotenv().ok();
    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
