use std::collections::HashMap;

use crate::adjustments::ManualAdjustment;
use crate::errors::{LedgerError, ValidationError};
use crate::ledger::normalize_symbol;
use crate::portfolio::{is_quantity_significant, Holding};

/// Keyed set of [`ManualAdjustment`]s, applied on top of computed holdings.
///
/// The overlay never touches the ledger. It is re-applied on every recompute,
/// so corrections persist until they are explicitly deleted.
#[derive(Clone, Debug, Default)]
pub struct AdjustmentOverlay {
    adjustments: HashMap<String, ManualAdjustment>,
}

impl AdjustmentOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the overlay from persisted state. Keys are expected to be
    /// normalized symbols, which is what [`as_map`](Self::as_map) produces.
    pub fn from_map(adjustments: HashMap<String, ManualAdjustment>) -> Self {
        Self { adjustments }
    }

    pub fn as_map(&self) -> &HashMap<String, ManualAdjustment> {
        &self.adjustments
    }

    /// Insert or replace the adjustment for a symbol. An existing entry of a
    /// different kind is overwritten, there is at most one adjustment per
    /// symbol.
    pub fn set(
        &mut self,
        symbol: &str,
        adjustment: ManualAdjustment,
    ) -> Result<(), ValidationError> {
        let key = normalize_symbol(symbol)?;
        adjustment.validate()?;
        self.adjustments.insert(key, adjustment);
        Ok(())
    }

    /// Delete the adjustment for a symbol, restoring computed values on the
    /// next recompute.
    pub fn remove(&mut self, symbol: &str) -> Result<ManualAdjustment, LedgerError> {
        let key = symbol.trim().to_uppercase();
        self.adjustments
            .remove(&key)
            .ok_or(LedgerError::AdjustmentNotFound(key))
    }

    pub fn get(&self, symbol: &str) -> Option<&ManualAdjustment> {
        self.adjustments.get(&symbol.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.adjustments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Apply every adjustment to the computed holdings map, then sweep out
    /// entries whose quantity fell below the dust threshold.
    ///
    /// `Removed` deletes the entry outright. `Override` replaces quantity and
    /// average cost, derives total cost from them, and drops the computed
    /// lots; an override for a symbol with no computed holding creates one.
    pub fn apply(&self, holdings: &mut HashMap<String, Holding>) {
        for (symbol, adjustment) in &self.adjustments {
            match adjustment {
                ManualAdjustment::Removed => {
                    holdings.remove(symbol);
                }
                ManualAdjustment::Override {
                    quantity,
                    average_cost,
                } => {
                    let holding = holdings
                        .entry(symbol.clone())
                        .or_insert_with(|| Holding::new(symbol.clone()));
                    holding.quantity = *quantity;
                    holding.average_cost = *average_cost;
                    holding.total_cost = *quantity * *average_cost;
                    holding.lots.clear();
                    holding.is_manually_adjusted = true;
                }
            }
        }

        holdings.retain(|_, holding| is_quantity_significant(&holding.quantity));
    }
}
