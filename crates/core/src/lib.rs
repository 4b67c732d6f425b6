//! Lotfolio Core - FIFO lot accounting and the live portfolio engine.
//!
//! This crate owns the transaction ledger, lot matching, manual adjustments
//! and portfolio valuation. It is storage- and provider-agnostic: quotes
//! arrive through `lotfolio_market_data::QuoteProvider` and persistence goes
//! through the `store::PortfolioStore` trait.

pub mod adjustments;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod portfolio;
pub mod store;

// Re-export the types an embedder touches day to day
pub use adjustments::{AdjustmentOverlay, ManualAdjustment};
pub use ledger::{Ledger, NewTransaction, Transaction, TransactionSide};
pub use portfolio::*;
pub use store::{JsonFileStore, MemoryStore, PortfolioStore};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
