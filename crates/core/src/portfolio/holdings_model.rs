use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;

/// The unsold remainder of a single buy, consumed oldest-first by sells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLot {
    /// Id of the buy transaction this lot came from.
    pub transaction_id: String,
    pub date: NaiveDate,
    /// Remaining quantity; shrinks as later sells consume the lot.
    pub quantity: Decimal,
    pub cost_per_share: Decimal,
}

impl PurchaseLot {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.cost_per_share
    }
}

/// One symbol's position together with its optional live valuation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub symbol: String,

    // Lot-derived position data
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub total_cost: Decimal,
    pub lots: Vec<PurchaseLot>,
    pub is_manually_adjusted: bool,

    // Valuation; None whenever no quote is available for the symbol
    pub market_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub unrealized_pl: Option<Decimal>,
    pub unrealized_pl_percent: Option<Decimal>,
    pub price_updated_at: Option<DateTime<Utc>>,
}

impl Holding {
    pub fn new(symbol: impl Into<String>) -> Self {
        Holding {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            lots: Vec::new(),
            is_manually_adjusted: false,
            market_price: None,
            market_value: None,
            unrealized_pl: None,
            unrealized_pl_percent: None,
            price_updated_at: None,
        }
    }
}

fn quantity_threshold() -> Decimal {
    Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8))
}

/// Positions below the dust threshold are dropped from the final view.
pub(crate) fn is_quantity_significant(quantity: &Decimal) -> bool {
    *quantity >= quantity_threshold()
}
