//! Quote provider view over the streaming tick cache.

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::QuoteProvider;
use crate::stream::manager::StreamManager;

const SOURCE_ID: &str = "STREAM";

/// Serves the last tick per symbol as a [`Quote`].
///
/// Lets the portfolio engine consume a push feed through the same trait as a
/// REST poll: `track_symbols` keeps the feed subscribed to whatever is held,
/// `get_quote` answers from the cache without touching the network.
pub struct StreamQuoteSource {
    manager: Arc<StreamManager>,
}

impl StreamQuoteSource {
    pub fn new(manager: Arc<StreamManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl QuoteProvider for StreamQuoteSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.manager
            .last_tick(symbol)
            .map(Quote::from)
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }

    fn track_symbols(&self, symbols: &[String]) {
        if let Err(e) = self.manager.subscribe(symbols.to_vec()) {
            warn!("stream subscription update failed: {}", e);
        }
    }
}
