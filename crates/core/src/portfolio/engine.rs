use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::adjustments::{AdjustmentOverlay, ManualAdjustment};
use crate::errors::Result;
use crate::ledger::{Ledger, NewTransaction, Transaction};
use crate::portfolio::{
    compute_holdings, Holding, OversellWarning, PortfolioHistory, PortfolioView,
    ValuationOutcome, Valuator,
};
use crate::store::PortfolioStore;
use lotfolio_market_data::QuoteProvider;

/// Engine tunables.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Budget for one quote request during a valuation pass.
    pub quote_timeout: Duration,
    /// Wake the revaluation worker after every change. Turn off to drive
    /// [`PortfolioEngine::revalue`] manually.
    pub auto_revalue: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_timeout: Duration::from_secs(5),
            auto_revalue: true,
        }
    }
}

/// Everything guarded by the engine's mutex.
///
/// `generation` counts recomputes; `valued_generation` is the generation the
/// last completed valuation pass priced. The two match exactly when the
/// published view is fully priced.
struct EngineState {
    ledger: Ledger,
    overlay: AdjustmentOverlay,
    holdings: HashMap<String, Holding>,
    warnings: Vec<OversellWarning>,
    generation: u64,
    valued_generation: u64,
}

/// Owns the ledger, the adjustment overlay and the published portfolio view.
///
/// Every mutation recomputes holdings and publishes a fresh view inside one
/// critical section, so subscribers observe changes in mutation order and
/// never see partial state. Valuation runs outside the lock and republishes
/// a priced view only when no mutation landed in the meantime.
pub struct PortfolioEngine {
    state: Mutex<EngineState>,
    valuator: Valuator,
    store: Arc<dyn PortfolioStore>,
    view_tx: watch::Sender<Arc<PortfolioView>>,
    revalue_notify: Notify,
    config: EngineConfig,
}

impl PortfolioEngine {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn PortfolioStore>,
        config: EngineConfig,
    ) -> Self {
        let (view_tx, _) = watch::channel(Arc::new(PortfolioView::empty()));
        Self {
            state: Mutex::new(EngineState {
                ledger: Ledger::new(),
                overlay: AdjustmentOverlay::new(),
                holdings: HashMap::new(),
                warnings: Vec::new(),
                generation: 0,
                valued_generation: 0,
            }),
            valuator: Valuator::new(provider, config.quote_timeout),
            store,
            view_tx,
            revalue_notify: Notify::new(),
            config,
        }
    }

    /// Pull both persisted collections, recompute and publish the first real
    /// view. Prices arrive with the valuation pass this schedules.
    pub async fn load(&self) -> Result<()> {
        let transactions = self.store.load_transactions().await?;
        let adjustments = self.store.load_adjustments().await?;
        info!(
            "Loaded {} transactions and {} adjustments",
            transactions.len(),
            adjustments.len()
        );

        {
            let mut state = self.lock_state();
            state.ledger = Ledger::from_transactions(transactions);
            state.overlay = AdjustmentOverlay::from_map(adjustments);
            self.recompute_and_publish(&mut state);
        }
        self.request_revalue();
        Ok(())
    }

    // === Mutations ===

    /// Validate and record a trade, then recompute, publish and persist.
    pub async fn add_transaction(&self, record: NewTransaction) -> Result<Transaction> {
        let (transaction, transactions) = {
            let mut state = self.lock_state();
            let transaction = state.ledger.add(record)?;
            self.recompute_and_publish(&mut state);
            (transaction, state.ledger.transactions().to_vec())
        };
        self.persist_transactions(transactions).await?;
        Ok(transaction)
    }

    /// Delete a trade by id. Returns the removed transaction.
    pub async fn remove_transaction(&self, id: &str) -> Result<Transaction> {
        let (transaction, transactions) = {
            let mut state = self.lock_state();
            let transaction = state.ledger.remove(id)?;
            self.recompute_and_publish(&mut state);
            (transaction, state.ledger.transactions().to_vec())
        };
        self.persist_transactions(transactions).await?;
        Ok(transaction)
    }

    /// Bulk-load trades, either appending to or replacing the ledger. The
    /// whole batch is validated before anything is recorded.
    pub async fn import_transactions(
        &self,
        records: Vec<NewTransaction>,
        replace: bool,
    ) -> Result<Vec<Transaction>> {
        let (imported, transactions) = {
            let mut state = self.lock_state();
            let imported = state.ledger.import(records, replace)?;
            self.recompute_and_publish(&mut state);
            (imported, state.ledger.transactions().to_vec())
        };
        self.persist_transactions(transactions).await?;
        Ok(imported)
    }

    /// Insert or replace the manual adjustment for a symbol.
    pub async fn set_adjustment(&self, symbol: &str, adjustment: ManualAdjustment) -> Result<()> {
        let adjustments = {
            let mut state = self.lock_state();
            state.overlay.set(symbol, adjustment)?;
            self.recompute_and_publish(&mut state);
            state.overlay.as_map().clone()
        };
        self.persist_adjustments(adjustments).await
    }

    /// Delete the manual adjustment for a symbol, restoring computed values.
    pub async fn remove_adjustment(&self, symbol: &str) -> Result<ManualAdjustment> {
        let (removed, adjustments) = {
            let mut state = self.lock_state();
            let removed = state.overlay.remove(symbol)?;
            self.recompute_and_publish(&mut state);
            (removed, state.overlay.as_map().clone())
        };
        self.persist_adjustments(adjustments).await?;
        Ok(removed)
    }

    // === Valuation ===

    /// Run one valuation pass over the current holdings.
    ///
    /// Quotes are fetched without the state lock. If a mutation lands while
    /// they are in flight the batch is discarded on arrival; the worker gets
    /// woken by that mutation and prices the new state instead.
    pub async fn revalue(&self) -> ValuationOutcome {
        let (generation, mut holdings) = {
            let state = self.lock_state();
            (state.generation, state.holdings.clone())
        };

        let mut symbols: Vec<String> = holdings.keys().cloned().collect();
        symbols.sort();
        self.valuator.track_symbols(&symbols);

        let outcome = self.valuator.value_holdings(&mut holdings).await;

        let mut state = self.lock_state();
        if state.generation != generation {
            debug!(
                "Discarding valuation batch for generation {} (portfolio is at {})",
                generation, state.generation
            );
            return outcome;
        }

        state.holdings = holdings;
        state.valued_generation = generation;
        self.publish(&state, false);

        if outcome.failures.is_empty() {
            debug!("Valuation pass priced {} holdings", outcome.priced);
        } else {
            warn!(
                "Valuation pass priced {} holdings, {} symbols unpriced",
                outcome.priced,
                outcome.failures.len()
            );
        }
        outcome
    }

    /// Value the current holdings over a past date range, for charting.
    pub async fn portfolio_history(&self, start: NaiveDate, end: NaiveDate) -> PortfolioHistory {
        let holdings = { self.lock_state().holdings.clone() };
        self.valuator.value_history(&holdings, start, end).await
    }

    /// Background task that runs a valuation pass whenever one is requested.
    /// Wakeups coalesce: many changes in quick succession produce one pass
    /// over the final state.
    pub fn spawn_revaluation_worker(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                self.revalue_notify.notified().await;
                self.revalue().await;
            }
        })
    }

    // === Reads ===

    /// The most recently published snapshot.
    pub fn get_portfolio(&self) -> Arc<PortfolioView> {
        self.view_tx.borrow().clone()
    }

    /// True while the published view awaits prices for its generation.
    pub fn is_refreshing(&self) -> bool {
        let state = self.lock_state();
        state.valued_generation != state.generation
    }

    /// Watch the published view. The receiver always starts with the current
    /// snapshot and sees every later one in publication order.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PortfolioView>> {
        self.view_tx.subscribe()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock_state().ledger.transactions().to_vec()
    }

    /// All trades for one symbol in matching order: date ascending, buys
    /// before sells within a day.
    pub fn transactions_for(&self, symbol: &str) -> Vec<Transaction> {
        self.lock_state().ledger.transactions_for(symbol)
    }

    pub fn adjustments(&self) -> HashMap<String, ManualAdjustment> {
        self.lock_state().overlay.as_map().clone()
    }

    // === Internals ===

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Engine state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Replay the ledger, apply the overlay, bump the generation and publish
    /// the unpriced view. Runs inside the caller's critical section.
    fn recompute_and_publish(&self, state: &mut EngineState) {
        let result = compute_holdings(state.ledger.transactions());
        state.holdings = result.holdings;
        state.warnings = result.warnings;
        state.overlay.apply(&mut state.holdings);
        state.generation += 1;
        self.publish(state, true);
    }

    fn publish(&self, state: &EngineState, refreshing: bool) {
        let view = PortfolioView::assemble(
            &state.holdings,
            &state.warnings,
            refreshing,
            state.generation,
        );
        self.view_tx.send_replace(Arc::new(view));
    }

    fn request_revalue(&self) {
        if self.config.auto_revalue {
            self.revalue_notify.notify_one();
        }
    }

    async fn persist_transactions(&self, transactions: Vec<Transaction>) -> Result<()> {
        let saved = self.store.save_transactions(&transactions).await;
        self.request_revalue();
        if let Err(error) = &saved {
            error!("Failed to persist transactions: {}", error);
        }
        Ok(saved?)
    }

    async fn persist_adjustments(
        &self,
        adjustments: HashMap<String, ManualAdjustment>,
    ) -> Result<()> {
        let saved = self.store.save_adjustments(&adjustments).await;
        self.request_revalue();
        if let Err(error) = &saved {
            error!("Failed to persist adjustments: {}", error);
        }
        Ok(saved?)
    }
}
