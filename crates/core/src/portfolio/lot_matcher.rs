use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{sort_for_matching, Transaction, TransactionSide};
use crate::portfolio::{is_quantity_significant, Holding, PurchaseLot};

/// Non-fatal report emitted when a sell exceeds the quantity on hand.
///
/// The affected symbol's lots are discarded rather than driven negative, so
/// the rest of the portfolio stays computable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OversellWarning {
    pub symbol: String,
    pub transaction_id: String,
    pub requested: Decimal,
    pub available: Decimal,
}

impl fmt::Display for OversellWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sell of {} {} exceeds the {} available (transaction {}); position discarded",
            self.requested, self.symbol, self.available, self.transaction_id
        )
    }
}

/// Result of replaying the ledger: per-symbol holdings plus any oversell
/// warnings raised along the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LotMatch {
    pub holdings: HashMap<String, Holding>,
    pub warnings: Vec<OversellWarning>,
}

/// Replay the full transaction history into per-symbol holdings.
///
/// Transactions are processed in date order with buys ahead of sells on the
/// same day. Buys open lots; sells consume them oldest-first. A sell larger
/// than the quantity on hand discards every lot for that symbol and reports
/// an [`OversellWarning`] instead of going negative.
///
/// The input order does not matter, the replay sorts a copy internally.
pub fn compute_holdings(transactions: &[Transaction]) -> LotMatch {
    let mut ordered = transactions.to_vec();
    sort_for_matching(&mut ordered);

    let mut lots: HashMap<String, VecDeque<PurchaseLot>> = HashMap::new();
    let mut warnings = Vec::new();

    for transaction in &ordered {
        match transaction.side {
            TransactionSide::Buy => {
                lots.entry(transaction.symbol.clone())
                    .or_default()
                    .push_back(PurchaseLot {
                        transaction_id: transaction.id.clone(),
                        date: transaction.date,
                        quantity: transaction.quantity,
                        cost_per_share: transaction.price_per_share,
                    });
            }
            TransactionSide::Sell => {
                let symbol_lots = lots.entry(transaction.symbol.clone()).or_default();
                let available: Decimal = symbol_lots.iter().map(|lot| lot.quantity).sum();

                if available < transaction.quantity {
                    warn!(
                        "Sell of {} {} exceeds the {} available (transaction {}); discarding the position",
                        transaction.quantity, transaction.symbol, available, transaction.id
                    );
                    warnings.push(OversellWarning {
                        symbol: transaction.symbol.clone(),
                        transaction_id: transaction.id.clone(),
                        requested: transaction.quantity,
                        available,
                    });
                    symbol_lots.clear();
                    continue;
                }

                let mut remaining = transaction.quantity;
                while remaining > Decimal::ZERO {
                    let Some(front) = symbol_lots.front_mut() else {
                        break;
                    };
                    let consumed = remaining.min(front.quantity);
                    front.quantity -= consumed;
                    remaining -= consumed;
                    if !is_quantity_significant(&front.quantity) {
                        symbol_lots.pop_front();
                    }
                }
            }
        }
    }

    LotMatch {
        holdings: aggregate(lots),
        warnings,
    }
}

/// Collapse surviving lots into [`Holding`]s. Symbols whose remaining
/// quantity is below the dust threshold are left out entirely.
fn aggregate(lots: HashMap<String, VecDeque<PurchaseLot>>) -> HashMap<String, Holding> {
    let mut holdings = HashMap::new();

    for (symbol, symbol_lots) in lots {
        let quantity: Decimal = symbol_lots.iter().map(|lot| lot.quantity).sum();
        if !is_quantity_significant(&quantity) {
            continue;
        }

        let total_cost: Decimal = symbol_lots.iter().map(|lot| lot.cost_basis()).sum();
        let mut holding = Holding::new(symbol.clone());
        holding.quantity = quantity;
        holding.total_cost = total_cost;
        holding.average_cost = total_cost / quantity;
        holding.lots = symbol_lots.into();
        holdings.insert(symbol, holding);
    }

    holdings
}
