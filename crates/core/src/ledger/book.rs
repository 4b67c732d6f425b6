use std::cmp::Ordering;

use crate::errors::{LedgerError, ValidationError};

use super::ledger_model::{NewTransaction, Transaction};

/// Owned collection of transactions.
///
/// Entries keep their recorded order; matching order (date ascending, buys
/// before sells within a day) is derived on demand and never mutates the
/// book. The ledger records history only and holds no position state.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the book from persisted entries, keeping their order.
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Validate and record one trade.
    pub fn add(&mut self, record: NewTransaction) -> Result<Transaction, ValidationError> {
        let transaction = record.into_transaction()?;
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Remove a trade by id.
    pub fn remove(&mut self, id: &str) -> Result<Transaction, LedgerError> {
        match self.transactions.iter().position(|t| t.id == id) {
            Some(index) => Ok(self.transactions.remove(index)),
            None => Err(LedgerError::TransactionNotFound(id.to_string())),
        }
    }

    /// Record a batch of already-parsed trades.
    ///
    /// With `replace` the batch becomes the whole book, otherwise it appends.
    /// Validation is all-or-nothing across the batch: one bad record rejects
    /// the import and leaves the book untouched.
    pub fn import(
        &mut self,
        records: Vec<NewTransaction>,
        replace: bool,
    ) -> Result<Vec<Transaction>, ValidationError> {
        let mut imported = Vec::with_capacity(records.len());
        for record in records {
            imported.push(record.into_transaction()?);
        }

        if replace {
            self.transactions = imported.clone();
        } else {
            self.transactions.extend(imported.iter().cloned());
        }
        Ok(imported)
    }

    /// All entries in recorded order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All trades for one symbol, in matching order.
    ///
    /// The symbol is matched after normalization, so `" aapl "` finds
    /// `"AAPL"`. An unknown or blank symbol yields an empty list.
    pub fn transactions_for(&self, symbol: &str) -> Vec<Transaction> {
        let symbol = symbol.trim().to_uppercase();
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.symbol == symbol)
            .cloned()
            .collect();
        sort_for_matching(&mut matching);
        matching
    }

    /// Every trade in matching order.
    pub fn sorted_for_matching(&self) -> Vec<Transaction> {
        let mut sorted = self.transactions.clone();
        sort_for_matching(&mut sorted);
        sorted
    }
}

/// Order trades for lot matching: date ascending, buys before sells on the
/// same date. The sort is stable, so recorded order breaks remaining ties.
pub(crate) fn sort_for_matching(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| match a.date.cmp(&b.date) {
        Ordering::Equal => a.side.matching_rank().cmp(&b.side.matching_rank()),
        other => other,
    });
}
