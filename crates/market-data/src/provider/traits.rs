//! Quote provider trait definition.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, Quote};

/// Trait for quote backends.
///
/// The portfolio engine talks to market data exclusively through this trait;
/// whether prices come from a REST poll or a streaming feed is invisible to
/// it. Implementations must be cheap to call concurrently: the engine fans
/// out one `get_quote` per held symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FINNHUB" or "STREAM".
    /// Used for logging and error attribution.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for a symbol.
    ///
    /// Symbols arrive already normalized (trimmed, uppercase). A failure
    /// concerns that symbol only; callers isolate it and keep going.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch daily historical bars for a symbol, both endpoints inclusive.
    ///
    /// Bars are ordered by date ascending. Default implementation returns
    /// `NotSupported`.
    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        let _ = (symbol, start, end);
        Err(MarketDataError::NotSupported {
            operation: "get_history".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Tell the provider which symbols are currently held.
    ///
    /// Streaming backends use this to keep their subscriptions aligned with
    /// the portfolio; polling backends ignore it. Default implementation is
    /// a no-op.
    fn track_symbols(&self, symbols: &[String]) {
        let _ = symbols;
    }
}
