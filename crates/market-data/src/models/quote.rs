use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest traded quote for a single symbol.
///
/// `price` is the only field a provider must supply; the session fields
/// depend on what the backend exposes and stay `None` when absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Symbol the quote belongs to, already normalized (uppercase, trimmed)
    pub symbol: String,

    /// Last traded / current price
    pub price: Decimal,

    /// Absolute change since previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change since previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_change: Option<Decimal>,

    /// Session high
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    /// Session low
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    /// Session open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    /// When the price was observed
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote with only the required fields set.
    pub fn new(symbol: impl Into<String>, price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change: None,
            percent_change: None,
            high: None,
            low: None,
            open: None,
            previous_close: None,
            timestamp,
        }
    }
}

/// One daily bar of historical trading data.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBar {
    /// Trading day the bar covers
    pub date: NaiveDate,

    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,

    /// Trading volume, when the backend reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}
