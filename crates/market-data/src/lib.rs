//! Lotfolio Market Data Crate
//!
//! Provider-agnostic quote sourcing for the portfolio engine.
//!
//! # Overview
//!
//! The crate supports:
//! - Latest quotes and daily history through the [`QuoteProvider`] trait
//! - Finnhub REST backend (`/quote`, `/stock/candle`)
//! - Streaming feeds with owned connection lifecycle (reconnect, backoff,
//!   subscription replay) behind an abstract transport
//!
//! # Architecture
//!
//! ```text
//! +------------------+      +------------------+
//! | Portfolio engine | ---> |  QuoteProvider   |  (trait object)
//! +------------------+      +------------------+
//!                              |            |
//!                              v            v
//!                    +-----------------+  +-------------------+
//!                    | FinnhubProvider |  | StreamQuoteSource |
//!                    |   (REST poll)   |  |   (tick cache)    |
//!                    +-----------------+  +-------------------+
//!                                                  |
//!                                                  v
//!                                          +---------------+
//!                                          | StreamManager |
//!                                          +---------------+
//!                                                  |
//!                                                  v
//!                                          +-----------------+
//!                                          | StreamTransport |  (wire protocol)
//!                                          +-----------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - latest price with optional session fields
//! - [`HistoricalBar`] - one daily OHLCV bar
//! - [`StreamTick`] - single streamed price update
//! - [`MarketDataError`] - failure taxonomy shared by all backends

pub mod errors;
pub mod models;
pub mod provider;
pub mod stream;

// Re-export the error type
pub use errors::MarketDataError;

// Re-export all public types from models
pub use models::{HistoricalBar, Quote, StreamTick};

// Re-export provider types
pub use provider::finnhub::FinnhubProvider;
pub use provider::QuoteProvider;

// Re-export stream types
pub use stream::{
    StreamConfig, StreamConnection, StreamEvent, StreamManager, StreamQuoteSource, StreamRequest,
    StreamTransport,
};
