//! Shared ledger handle for concurrent hosts
//!
//! Readers share the lock; each mutation holds the write lock for its whole
//! duration, so callers never observe a half-applied operation. With storage
//! attached, a mutation is applied to a draft, persisted, then swapped in.

use super::address::Address;
use super::call::LedgerCall;
use super::error::TokenError;
use super::events::LedgerEvent;
use super::ledger::TokenLedger;
use crate::storage::{Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Rejected: {0}")]
    Token(#[from] TokenError),
    #[error("Not persisted: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Clone)]
pub struct SharedLedger {
    ledger: Arc<RwLock<TokenLedger>>,
    storage: Option<Arc<Storage>>,
}

impl SharedLedger {
    /// In-memory only
    pub fn new(ledger: TokenLedger) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage: None,
        }
    }

    /// Every successful mutation is saved before it becomes visible
    pub fn with_storage(ledger: TokenLedger, storage: Storage) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            storage: Some(Arc::new(storage)),
        }
    }

    /// Run a read-only closure against the current state
    pub async fn query<R>(&self, f: impl FnOnce(&TokenLedger) -> R) -> R {
        let ledger = self.ledger.read().await;
        f(&ledger)
    }

    pub async fn execute(
        &self,
        caller: &Address,
        call: &LedgerCall,
    ) -> Result<LedgerEvent, ServiceError> {
        let mut ledger = self.ledger.write().await;

        let Some(storage) = &self.storage else {
            return Ok(ledger.execute(caller, call)?);
        };

        let mut draft = ledger.clone();
        let event = draft.execute(caller, call)?;
        storage.save(&draft)?;
        *ledger = draft;
        Ok(event)
    }

    /// Owned copy of the current state
    pub async fn snapshot(&self) -> TokenLedger {
        self.ledger.read().await.clone()
    }
}
