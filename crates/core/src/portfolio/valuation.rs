use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::constants::DECIMAL_PRECISION;
use crate::portfolio::Holding;
use lotfolio_market_data::{HistoricalBar, MarketDataError, Quote, QuoteProvider};

/// One symbol whose quote request did not produce a price.
///
/// Quote trouble is reported, never escalated: the holding keeps `None`
/// valuation fields and the rest of the batch proceeds.
#[derive(Debug)]
pub struct QuoteFailure {
    pub symbol: String,
    pub error: MarketDataError,
}

impl fmt::Display for QuoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.symbol, self.error)
    }
}

/// Tally of a completed valuation pass.
#[derive(Debug, Default)]
pub struct ValuationOutcome {
    pub priced: usize,
    pub failures: Vec<QuoteFailure>,
}

/// Total portfolio value on one date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Date-ascending value series plus the symbols that had no data.
#[derive(Debug, Default)]
pub struct PortfolioHistory {
    pub points: Vec<HistoryPoint>,
    pub failures: Vec<QuoteFailure>,
}

/// Prices holdings against a [`QuoteProvider`].
///
/// All requests in a pass run concurrently, each clamped by its own timeout,
/// and the pass completes only when every request has settled.
#[derive(Clone)]
pub struct Valuator {
    provider: Arc<dyn QuoteProvider>,
    quote_timeout: Duration,
}

impl Valuator {
    pub fn new(provider: Arc<dyn QuoteProvider>, quote_timeout: Duration) -> Self {
        Self {
            provider,
            quote_timeout,
        }
    }

    /// Tell the provider which symbols the portfolio currently holds, so
    /// push-feed backends can adjust their subscriptions. No-op for REST
    /// providers.
    pub fn track_symbols(&self, symbols: &[String]) {
        self.provider.track_symbols(symbols);
    }

    /// Fill valuation fields on every holding a quote arrives for.
    ///
    /// Holdings whose request fails or times out keep all valuation fields
    /// `None`; the failures are collected in the outcome per symbol.
    pub async fn value_holdings(&self, holdings: &mut HashMap<String, Holding>) -> ValuationOutcome {
        if holdings.is_empty() {
            return ValuationOutcome::default();
        }

        let symbols: Vec<String> = holdings.keys().cloned().collect();
        let fetches = symbols.iter().map(|symbol| self.fetch_quote(symbol));
        let results = future::join_all(fetches).await;

        let mut outcome = ValuationOutcome::default();
        for (symbol, result) in symbols.into_iter().zip(results) {
            match result {
                Ok(quote) => {
                    if let Some(holding) = holdings.get_mut(&symbol) {
                        apply_quote(holding, &quote);
                        outcome.priced += 1;
                    }
                }
                Err(error) => {
                    if error.is_transient() {
                        debug!("Quote for {} unavailable: {}", symbol, error);
                    } else {
                        warn!("Quote for {} failed: {}", symbol, error);
                    }
                    outcome.failures.push(QuoteFailure { symbol, error });
                }
            }
        }

        outcome
    }

    /// Value the current holdings over a past date range, one point per
    /// trading day, summed across symbols. Symbols without data for the range
    /// are reported in `failures` and left out of the sums.
    pub async fn value_history(
        &self,
        holdings: &HashMap<String, Holding>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortfolioHistory {
        let positions: Vec<(String, Decimal)> = holdings
            .values()
            .map(|holding| (holding.symbol.clone(), holding.quantity))
            .collect();

        let fetches = positions
            .iter()
            .map(|(symbol, _)| self.fetch_history(symbol, start, end));
        let results = future::join_all(fetches).await;

        let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        let mut failures = Vec::new();
        for ((symbol, quantity), result) in positions.into_iter().zip(results) {
            match result {
                Ok(bars) => {
                    for bar in bars {
                        *totals.entry(bar.date).or_insert(Decimal::ZERO) += bar.close * quantity;
                    }
                }
                Err(error) => {
                    warn!("History for {} failed: {}", symbol, error);
                    failures.push(QuoteFailure { symbol, error });
                }
            }
        }

        PortfolioHistory {
            points: totals
                .into_iter()
                .map(|(date, value)| HistoryPoint { date, value })
                .collect(),
            failures,
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        match time::timeout(self.quote_timeout, self.provider.get_quote(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.provider.id().to_string(),
            }),
        }
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalBar>, MarketDataError> {
        match time::timeout(self.quote_timeout, self.provider.get_history(symbol, start, end))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.provider.id().to_string(),
            }),
        }
    }
}

fn apply_quote(holding: &mut Holding, quote: &Quote) {
    let market_value = quote.price * holding.quantity;
    // Computed from market value and cost basis directly, so the P/L is exact
    // even when the average cost carries a repeating fraction.
    let unrealized_pl = market_value - holding.total_cost;

    holding.market_price = Some(quote.price);
    holding.market_value = Some(market_value);
    holding.unrealized_pl = Some(unrealized_pl);
    holding.unrealized_pl_percent = percent_return(unrealized_pl, holding.total_cost, market_value);
    holding.price_updated_at = Some(quote.timestamp);
}

/// Percent return on cost basis.
///
/// With a zero cost basis and positive market value the true percent is
/// unbounded, which `Decimal` cannot carry; `None` signals that case and the
/// absolute P/L still tells the story. Zero basis and zero value is flat.
pub(crate) fn percent_return(
    unrealized_pl: Decimal,
    cost_basis: Decimal,
    market_value: Decimal,
) -> Option<Decimal> {
    if cost_basis > Decimal::ZERO {
        Some(((unrealized_pl / cost_basis) * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION))
    } else if market_value > Decimal::ZERO {
        None
    } else {
        Some(Decimal::ZERO)
    }
}
