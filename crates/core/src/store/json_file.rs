use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use crate::adjustments::ManualAdjustment;
use crate::errors::StoreError;
use crate::ledger::Transaction;
use crate::store::PortfolioStore;

const TRANSACTIONS_FILE: &str = "transactions.json";
const ADJUSTMENTS_FILE: &str = "adjustments.json";

/// Persists both collections as JSON files in one directory.
///
/// Every save rewrites the collection's file in full, every load reads it in
/// full; a missing file reads as an empty collection, so the store works on
/// a fresh directory without setup.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_collection<T>(&self, file: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("No {} at {:?} yet, starting empty", file, self.dir);
                return Ok(T::default());
            }
            Err(error) => return Err(StoreError::LoadFailed(error.to_string())),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_collection<T>(&self, file: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let json = serde_json::to_vec_pretty(value)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|error| StoreError::SaveFailed(error.to_string()))?;
        fs::write(self.dir.join(file), json)
            .await
            .map_err(|error| StoreError::SaveFailed(error.to_string()))
    }
}

#[async_trait]
impl PortfolioStore for JsonFileStore {
    async fn load_transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        self.read_collection(TRANSACTIONS_FILE).await
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        self.write_collection(TRANSACTIONS_FILE, &transactions).await
    }

    async fn load_adjustments(&self) -> Result<HashMap<String, ManualAdjustment>, StoreError> {
        self.read_collection(ADJUSTMENTS_FILE).await
    }

    async fn save_adjustments(
        &self,
        adjustments: &HashMap<String, ManualAdjustment>,
    ) -> Result<(), StoreError> {
        self.write_collection(ADJUSTMENTS_FILE, adjustments).await
    }
}
