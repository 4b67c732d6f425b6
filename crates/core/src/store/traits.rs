use std::collections::HashMap;

use async_trait::async_trait;

use crate::adjustments::ManualAdjustment;
use crate::errors::StoreError;
use crate::ledger::Transaction;

/// Persistence seam for the two durable collections.
///
/// The contract is whole-collection: every save replaces what was stored
/// before, every load returns everything. A save failure surfaces to the
/// caller while the in-memory portfolio stays authoritative; the next
/// successful save catches storage up.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError>;

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError>;

    async fn load_adjustments(&self) -> Result<HashMap<String, ManualAdjustment>, StoreError>;

    async fn save_adjustments(
        &self,
        adjustments: &HashMap<String, ManualAdjustment>,
    ) -> Result<(), StoreError>;
}
