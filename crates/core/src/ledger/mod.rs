//! Transaction ledger - the recorded trade history and its matching order.

mod book;
mod ledger_model;


pub use book::Ledger;
pub(crate) use book::sort_for_matching;
pub use ledger_model::{normalize_symbol, NewTransaction, Transaction, TransactionSide};
