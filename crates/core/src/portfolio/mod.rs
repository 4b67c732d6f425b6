//! Holdings computation and the live portfolio engine.
//!
//! The pipeline is: replay the ledger into FIFO lots (`compute_holdings`),
//! apply manual adjustments, value the result against a quote provider, and
//! publish each stage as an immutable [`PortfolioView`]. [`PortfolioEngine`]
//! owns the whole pipeline and its concurrency.

mod engine;
mod holdings_model;
mod lot_matcher;
mod valuation;
mod view;


pub use engine::{EngineConfig, PortfolioEngine};
pub use holdings_model::{Holding, PurchaseLot};
pub use lot_matcher::{compute_holdings, LotMatch, OversellWarning};
pub use valuation::{HistoryPoint, PortfolioHistory, QuoteFailure, ValuationOutcome, Valuator};
pub use view::{PortfolioSummary, PortfolioView};

pub(crate) use holdings_model::is_quantity_significant;
pub(crate) use valuation::percent_return;
