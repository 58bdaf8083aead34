//! Stock
//!
//! The stock ledger is the only component allowed to mutate product stock.
//! All call sites (checkout decrement, cancellation restore) share one
//! compare-and-swap path so the retry policy stays centralized.

pub mod ledger;
pub mod retry;

pub use ledger::StockLedger;
