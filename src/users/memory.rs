// src/users/memory.rs — In-memory user store (tests, development)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{AccountStatus, UserRecord, UserStore};
use crate::infra::errors::LeafmarketError;

#[derive(Default)]
pub struct MemoryUserStore {
    records: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, for tests and local development.
    pub fn insert(&self, uid: impl Into<String>, record: UserRecord) {
        self.records
            .write()
            .expect("user store lock poisoned")
            .insert(uid.into(), record);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, uid: &str) -> Result<Option<UserRecord>, LeafmarketError> {
        let records = self
            .records
            .read()
            .map_err(|e| LeafmarketError::Internal(anyhow::anyhow!("user store lock: {e}")))?;
        Ok(records.get(uid).cloned())
    }

    async fn set_stripe_account(
        &self,
        uid: &str,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| LeafmarketError::Internal(anyhow::anyhow!("user store lock: {e}")))?;
        let record = records
            .get_mut(uid)
            .ok_or_else(|| LeafmarketError::NotFound("User not found".into()))?;
        record.stripe_account_id = Some(account_id.to_string());
        record.stripe_account_status = Some(status);
        Ok(())
    }

    async fn set_account_status(
        &self,
        uid: &str,
        status: AccountStatus,
    ) -> Result<(), LeafmarketError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| LeafmarketError::Internal(anyhow::anyhow!("user store lock: {e}")))?;
        let record = records
            .get_mut(uid)
            .ok_or_else(|| LeafmarketError::NotFound("User not found".into()))?;
        record.stripe_account_status = Some(status);
        Ok(())
    }
}
