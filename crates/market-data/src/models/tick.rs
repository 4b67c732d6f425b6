use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// A single price update delivered over a streaming feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamTick {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,

    /// Volume carried by the tick (aggregate feeds report it, trade feeds may not)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl From<StreamTick> for Quote {
    fn from(tick: StreamTick) -> Self {
        Quote::new(tick.symbol, tick.price, tick.timestamp)
    }
}
