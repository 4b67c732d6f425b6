//! Quote provider abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that all quote backends implement
//! - The Finnhub REST implementation
//!
//! The portfolio engine holds a `QuoteProvider` trait object and never learns
//! which backend answers; per-symbol failures stay per-symbol.

mod traits;

pub mod finnhub;

pub use finnhub::FinnhubProvider;
pub use traits::QuoteProvider;
