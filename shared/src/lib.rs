//! Shared types for the marketplace core
//!
//! Common types used across crates: domain models, the error system and
//! response envelope, and small utilities (timestamps, ID generation).

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResponse, AppResult};
pub use serde::{Deserialize, Serialize};
