//! Transaction execution over an in-memory world state.
//!
//! Each invocation runs as one transaction: it gets a fresh UUIDv7 id and
//! timestamp, its writes are buffered, and they are committed only if the
//! contract function returns `Ok`. Invocations are serialized by a commit
//! lock, so every transaction sees the state left by the previous one.

use crate::contract::ContractError;
use crate::stub::{MemoryStub, MemoryWorldState, StateDatabase, TransactionContext};
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// Outcome of a successful invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<T> {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub value: T,
    /// Keys committed (always 0 for evaluations)
    pub writes: usize,
}

/// World state of one chaincode namespace plus its transaction runner
pub struct Ledger {
    name: String,
    world: MemoryWorldState,
    commit_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(name: impl Into<String>, database: StateDatabase) -> Self {
        Self {
            name: name.into(),
            world: MemoryWorldState::new(database),
            commit_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world_state(&self) -> &MemoryWorldState {
        &self.world
    }

    /// Runs `f` as a transaction and commits its writes if it succeeds
    pub fn submit<T, F>(&self, f: F) -> Result<Receipt<T>, ContractError>
    where
        F: FnOnce(&mut TransactionContext<'_>) -> Result<T, ContractError>,
    {
        self.execute(f, true)
    }

    /// Runs `f` against current state and discards whatever it writes
    pub fn evaluate<T, F>(&self, f: F) -> Result<Receipt<T>, ContractError>
    where
        F: FnOnce(&mut TransactionContext<'_>) -> Result<T, ContractError>,
    {
        self.execute(f, false)
    }

    fn execute<T, F>(&self, f: F, commit: bool) -> Result<Receipt<T>, ContractError>
    where
        F: FnOnce(&mut TransactionContext<'_>) -> Result<T, ContractError>,
    {
        // The guarded unit carries no data, so a poisoned lock is still usable
        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let tx_id = Uuid::now_v7().to_string();
        let timestamp = Utc::now();
        let mut stub = MemoryStub::new(&self.world, tx_id.clone(), timestamp);

        let result = {
            let mut ctx = TransactionContext::new(&mut stub);
            f(&mut ctx)
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    ledger = %self.name,
                    tx_id = %tx_id,
                    category = e.category(),
                    error = %e,
                    "Transaction rejected"
                );
                return Err(e);
            }
        };

        let writes = if commit {
            let writes = self
                .world
                .apply(&tx_id, timestamp, stub.into_write_set())
                .map_err(ContractError::StorageWrite)?;
            info!(ledger = %self.name, tx_id = %tx_id, writes = writes, "Transaction committed");
            writes
        } else {
            debug!(
                ledger = %self.name,
                tx_id = %tx_id,
                discarded = stub.write_count(),
                "Transaction evaluated"
            );
            0
        };

        Ok(Receipt {
            tx_id,
            timestamp,
            value,
            writes,
        })
    }
}
