use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use log::warn;

use crate::adjustments::ManualAdjustment;
use crate::errors::StoreError;
use crate::ledger::Transaction;
use crate::store::PortfolioStore;

/// Keeps both collections in memory. The default store for tests and for
/// embedders that handle persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: RwLock<Vec<Transaction>>,
    adjustments: RwLock<HashMap<String, ManualAdjustment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        let transactions = self.transactions.read().unwrap_or_else(|poisoned| {
            warn!("Memory store transactions lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Ok(transactions.clone())
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        let mut stored = self.transactions.write().unwrap_or_else(|poisoned| {
            warn!("Memory store transactions lock was poisoned, recovering");
            poisoned.into_inner()
        });
        *stored = transactions.to_vec();
        Ok(())
    }

    async fn load_adjustments(&self) -> Result<HashMap<String, ManualAdjustment>, StoreError> {
        let adjustments = self.adjustments.read().unwrap_or_else(|poisoned| {
            warn!("Memory store adjustments lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Ok(adjustments.clone())
    }

    async fn save_adjustments(
        &self,
        adjustments: &HashMap<String, ManualAdjustment>,
    ) -> Result<(), StoreError> {
        let mut stored = self.adjustments.write().unwrap_or_else(|poisoned| {
            warn!("Memory store adjustments lock was poisoned, recovering");
            poisoned.into_inner()
        });
        *stored = adjustments.clone();
        Ok(())
    }
}
