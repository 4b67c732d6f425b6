//! Core error types for the lot accounting engine.
//!
//! Persistence-specific errors are converted to [`StoreError`] by the store
//! implementations, keeping this module storage-agnostic. Per-symbol quote
//! failures never appear here: they are isolated inside the valuation pass
//! and reported on its outcome instead of failing an operation.

use rust_decimal::Decimal;
use thiserror::Error;

use lotfolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the portfolio engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),
}

/// Validation errors for transaction and adjustment input.
///
/// Validation is all-or-nothing: a rejected record leaves the ledger and
/// overlay untouched. Symbol normalization (trim + uppercase) is the only
/// transformation ever applied to input; nothing else is coerced.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Price per share must be positive, got {0}")]
    NonPositivePrice(Decimal),

    #[error("Override quantity must not be negative, got {0}")]
    NegativeQuantity(Decimal),

    #[error("Override average cost must not be negative, got {0}")]
    NegativeAverageCost(Decimal),
}

/// Errors for operations that reference ledger or overlay entries.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("No manual adjustment for symbol: {0}")]
    AdjustmentNotFound(String),
}

/// Storage-agnostic persistence errors.
///
/// A failed save surfaces to the caller but never rolls back the in-memory
/// state it was persisting; memory runs ahead of storage until the next
/// successful save.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read a persisted collection.
    #[error("Failed to load persisted state: {0}")]
    LoadFailed(String),

    /// Failed to write a persisted collection.
    #[error("Failed to save state: {0}")]
    SaveFailed(String),

    /// A collection could not be encoded or decoded.
    #[error("Failed to encode state: {0}")]
    Serialization(String),
}

// === From implementations for common error types ===

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
