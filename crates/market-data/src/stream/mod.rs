//! Streaming market data.
//!
//! Three pieces with one owner each:
//! - [`StreamTransport`] opens sessions; the wire protocol lives behind it
//! - [`StreamManager`] owns the connection lifecycle: reconnect with
//!   exponential backoff, subscription diffing and replay, tick fan-out,
//!   last-tick cache
//! - [`StreamQuoteSource`] adapts the tick cache to the [`QuoteProvider`]
//!   trait so the engine can price holdings off the feed
//!
//! [`QuoteProvider`]: crate::provider::QuoteProvider

mod manager;
mod quote_source;
mod transport;

pub use manager::{StreamConfig, StreamManager};
pub use quote_source::StreamQuoteSource;
pub use transport::{StreamConnection, StreamEvent, StreamRequest, StreamTransport};
