use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

/// Side of a trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    /// Matching order within one day: buys settle before sells, so a
    /// same-day buy-then-sell never reads as selling shares not yet held.
    pub(crate) fn matching_rank(&self) -> u8 {
        match self {
            TransactionSide::Buy => 0,
            TransactionSide::Sell => 1,
        }
    }
}

/// A single recorded trade, immutable once it enters the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Ledger-assigned identifier
    pub id: String,
    pub side: TransactionSide,
    /// Normalized symbol (trimmed, uppercase)
    pub symbol: String,
    pub quantity: Decimal,
    pub price_per_share: Decimal,
    /// Trade date; intra-day ordering is by side, buys first
    pub date: NaiveDate,
}

/// Input for recording a trade. The ledger assigns the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub side: TransactionSide,
    pub symbol: String,
    pub quantity: Decimal,
    pub price_per_share: Decimal,
    pub date: NaiveDate,
}

impl NewTransaction {
    /// Validate the record and mint the ledger entry.
    ///
    /// Quantity and price must be strictly positive; the symbol must be
    /// non-empty after normalization. A rejected record mutates nothing.
    pub fn into_transaction(self) -> Result<Transaction, ValidationError> {
        let symbol = normalize_symbol(&self.symbol)?;
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        if self.price_per_share <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(self.price_per_share));
        }

        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            side: self.side,
            symbol,
            quantity: self.quantity,
            price_per_share: self.price_per_share,
            date: self.date,
        })
    }
}

/// Trim and uppercase; the only transformation ever applied to a symbol.
pub fn normalize_symbol(symbol: &str) -> Result<String, ValidationError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    Ok(normalized)
}
