//! Finnhub quote provider.
//!
//! Latest quotes come from the `/quote` endpoint, daily history from
//! `/stock/candle`. The free tier allows 60 calls per minute; exceeding it
//! surfaces as [`MarketDataError::RateLimited`].
//!
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoricalBar, Quote};
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";
const API_KEY_ENV: &str = "FINNHUB_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// API payloads
// ============================================================================

/// Response from the /quote endpoint.
#[derive(Debug, Deserialize)]
struct QuotePayload {
    /// Current price
    c: Option<f64>,
    /// Change since previous close
    d: Option<f64>,
    /// Percent change since previous close
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix seconds)
    t: Option<i64>,
}

/// Response from the /stock/candle endpoint.
#[derive(Debug, Deserialize)]
struct CandlePayload {
    /// Status: "ok" or "no_data"
    s: String,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    /// Timestamps (Unix seconds)
    #[serde(default)]
    t: Vec<i64>,
}

/// Error body Finnhub attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Quote provider backed by the Finnhub REST API.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Create a provider from the `FINNHUB_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, MarketDataError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("{} is not set", API_KEY_ENV),
            }),
        }
    }

    /// GET an endpoint and decode its JSON body.
    async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url).query(&[("token", &self.api_key)]);
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("finnhub request: {}", endpoint);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network(e)
            }
        })?;

        let status = response.status();

        // Finnhub signals both bursts (429) and exhausted quotas (403)
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "invalid or missing API key".to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorPayload>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or_else(|| format!("HTTP {} - {}", status, body));
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let payload: QuotePayload = self.request_json("/quote", &[("symbol", symbol)]).await?;
        quote_from_payload(symbol, payload)
    }

    async fn get_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        let from_ts = day_start_ts(start).to_string();
        let to_ts = day_end_ts(end).to_string();

        let params = [
            ("symbol", symbol),
            ("resolution", "D"),
            ("from", from_ts.as_str()),
            ("to", to_ts.as_str()),
        ];

        let payload: CandlePayload = self.request_json("/stock/candle", &params).await?;
        let bars = bars_from_payload(payload)?;

        debug!(
            "finnhub: {} daily bars for {} ({} to {})",
            bars.len(),
            symbol,
            start,
            end
        );

        Ok(bars)
    }
}

// ============================================================================
// Payload mapping
// ============================================================================

/// Map a /quote payload onto [`Quote`].
///
/// Finnhub answers unknown symbols with an all-zero payload instead of an
/// error, so a zero price with a zero timestamp is treated as not found.
fn quote_from_payload(symbol: &str, payload: QuotePayload) -> Result<Quote, MarketDataError> {
    let price = payload
        .c
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    if price == 0.0 && payload.t.unwrap_or(0) == 0 {
        return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
    }

    let timestamp = payload
        .t
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .unwrap_or_else(Utc::now);

    let price = Decimal::try_from(price)
        .map_err(|_| MarketDataError::InvalidResponse(format!("unrepresentable price: {}", price)))?;

    Ok(Quote {
        symbol: symbol.to_string(),
        price,
        change: payload.d.and_then(|v| Decimal::try_from(v).ok()),
        percent_change: payload.dp.and_then(|v| Decimal::try_from(v).ok()),
        high: payload.h.and_then(|v| Decimal::try_from(v).ok()),
        low: payload.l.and_then(|v| Decimal::try_from(v).ok()),
        open: payload.o.and_then(|v| Decimal::try_from(v).ok()),
        previous_close: payload.pc.and_then(|v| Decimal::try_from(v).ok()),
        timestamp,
    })
}

/// Map a /stock/candle payload onto daily bars, ascending by date.
fn bars_from_payload(payload: CandlePayload) -> Result<Vec<HistoricalBar>, MarketDataError> {
    if payload.s == "no_data" {
        return Err(MarketDataError::NoDataForRange);
    }
    if payload.s != "ok" {
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("unexpected candle status: {}", payload.s),
        });
    }

    let len = payload.t.len();
    if payload.o.len() != len
        || payload.h.len() != len
        || payload.l.len() != len
        || payload.c.len() != len
    {
        return Err(MarketDataError::InvalidResponse(
            "mismatched candle array lengths".to_string(),
        ));
    }
    if len == 0 {
        return Err(MarketDataError::NoDataForRange);
    }

    let mut bars = Vec::with_capacity(len);
    for i in 0..len {
        let date = match Utc.timestamp_opt(payload.t[i], 0).single() {
            Some(ts) => ts.date_naive(),
            None => {
                warn!("skipping candle with invalid timestamp {}", payload.t[i]);
                continue;
            }
        };

        match (
            Decimal::try_from(payload.o[i]),
            Decimal::try_from(payload.h[i]),
            Decimal::try_from(payload.l[i]),
            Decimal::try_from(payload.c[i]),
        ) {
            (Ok(open), Ok(high), Ok(low), Ok(close)) => bars.push(HistoricalBar {
                date,
                open,
                high,
                low,
                close,
                volume: payload.v.get(i).and_then(|&v| Decimal::try_from(v).ok()),
            }),
            _ => warn!("skipping candle with unrepresentable prices on {}", date),
        }
    }

    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

fn day_start_ts(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
}

/// Inclusive end of day, so `to` covers the end date's candle.
fn day_end_ts(date: NaiveDate) -> i64 {
    day_start_ts(date) + 86_400 - 1
}

// ============================================================================
// Tests
// ============================================================================
