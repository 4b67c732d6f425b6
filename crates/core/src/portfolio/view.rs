use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::{percent_return, Holding, OversellWarning};

/// Immutable snapshot of the whole portfolio at one point in time.
///
/// A fresh view is published on every ledger or adjustment change and again
/// when a valuation pass lands; consumers hold an `Arc` to whichever view
/// they last read and are never shown partial state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    /// Holdings sorted by symbol.
    pub holdings: Vec<Holding>,
    pub warnings: Vec<OversellWarning>,
    /// True from a mutation until the matching valuation pass completes.
    pub refreshing: bool,
    /// Monotonic recompute counter; later views have larger generations.
    pub generation: u64,
    pub as_of: DateTime<Utc>,
}

/// Portfolio-level totals derived from a view.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pl: Decimal,
    pub unrealized_pl_percent: Option<Decimal>,
    /// Symbols with no market value in this view, in symbol order.
    pub unpriced_symbols: Vec<String>,
}

impl PortfolioView {
    /// The view published before any data is loaded.
    pub fn empty() -> Self {
        Self {
            holdings: Vec::new(),
            warnings: Vec::new(),
            refreshing: false,
            generation: 0,
            as_of: Utc::now(),
        }
    }

    pub(crate) fn assemble(
        holdings: &HashMap<String, Holding>,
        warnings: &[OversellWarning],
        refreshing: bool,
        generation: u64,
    ) -> Self {
        let mut list: Vec<Holding> = holdings.values().cloned().collect();
        list.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self {
            holdings: list,
            warnings: warnings.to_vec(),
            refreshing,
            generation,
            as_of: Utc::now(),
        }
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        let symbol = symbol.trim().to_uppercase();
        self.holdings.iter().find(|holding| holding.symbol == symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Totals across the portfolio.
    ///
    /// Market value and P/L cover priced holdings only, with the priced
    /// subset's cost basis as the percent denominator; unpriced symbols are
    /// named instead of being counted as zero. `cost_basis` always covers
    /// every holding.
    pub fn summary(&self) -> PortfolioSummary {
        let mut market_value = Decimal::ZERO;
        let mut cost_basis = Decimal::ZERO;
        let mut priced_cost = Decimal::ZERO;
        let mut unpriced_symbols = Vec::new();

        for holding in &self.holdings {
            cost_basis += holding.total_cost;
            match holding.market_value {
                Some(value) => {
                    market_value += value;
                    priced_cost += holding.total_cost;
                }
                None => unpriced_symbols.push(holding.symbol.clone()),
            }
        }

        let unrealized_pl = market_value - priced_cost;
        PortfolioSummary {
            market_value,
            cost_basis,
            unrealized_pl,
            unrealized_pl_percent: percent_return(unrealized_pl, priced_cost, market_value),
            unpriced_symbols,
        }
    }
}
