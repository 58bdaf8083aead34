//! Data models
//!
//! Shared between the server and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod address;
pub mod cart;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

// Re-exports
pub use address::*;
pub use cart::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use user::*;
