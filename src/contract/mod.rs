//! Record store facade shared by every entity contract.
//!
//! `RecordContract<R>` holds no state: it is built per invocation and does
//! all of its work through the [`TransactionContext`] it is handed.

use crate::record::{self, Record};
use crate::stub::{KeyValue, ResultsIterator, TransactionContext};
use std::marker::PhantomData;
use tracing::{debug, info};

mod error;

#[cfg(test)]
mod tests;

pub use error::ContractError;

/// Direction of a count adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Push,
    Pop,
}

/// Contract managing records of type `R`
pub struct RecordContract<R> {
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RecordContract<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    /// Writes the sample record set, overwriting existing values
    pub fn init_ledger(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ContractError> {
        let samples = R::samples();
        for item in &samples {
            self.put(ctx, item)?;
        }
        info!(kind = R::KIND, records = samples.len(), tx_id = %ctx.tx_id(), "Ledger initialized");
        Ok(())
    }

    /// True when `id` resolves to a non-empty value
    pub fn exists(&self, ctx: &TransactionContext<'_>, id: &str) -> Result<bool, ContractError> {
        let value = ctx
            .stub()
            .get_state(id)
            .map_err(ContractError::StorageRead)?;
        Ok(value.is_some_and(|v| !v.is_empty()))
    }

    /// Stores a new record; fails if its id is already taken
    pub fn add(&self, ctx: &mut TransactionContext<'_>, item: R) -> Result<(), ContractError> {
        record::validate(&item)?;
        if self.exists(ctx, item.id())? {
            return Err(ContractError::AlreadyExists {
                kind: R::KIND,
                id: item.id().to_string(),
            });
        }

        self.put(ctx, &item)?;
        info!(kind = R::KIND, id = %item.id(), tx_id = %ctx.tx_id(), "Record added");
        Ok(())
    }

    /// Builds a record from positional string arguments and stores it
    pub fn add_from_args(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        args: &[String],
    ) -> Result<(), ContractError> {
        let item = record::from_args::<R>(id, args)?;
        self.add(ctx, item)
    }

    pub fn get(&self, ctx: &TransactionContext<'_>, id: &str) -> Result<R, ContractError> {
        let value = ctx
            .stub()
            .get_state(id)
            .map_err(ContractError::StorageRead)?;

        match value {
            Some(bytes) if !bytes.is_empty() => record::decode(&bytes),
            _ => Err(ContractError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            }),
        }
    }

    /// Every record in the namespace, in key order
    pub fn get_all(&self, ctx: &TransactionContext<'_>) -> Result<Vec<R>, ContractError> {
        self.get_range(ctx, "", "")
    }

    /// Records with keys in `[start_key, end_key)`; empty bounds are open
    pub fn get_range(
        &self,
        ctx: &TransactionContext<'_>,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<R>, ContractError> {
        let results = ctx
            .stub()
            .get_state_by_range(start_key, end_key)
            .map_err(ContractError::StorageRead)?;
        Self::collect(results)
    }

    /// Runs a rich query against a document-oriented state database
    pub fn query(&self, ctx: &TransactionContext<'_>, query: &str) -> Result<Vec<R>, ContractError> {
        let results = ctx
            .stub()
            .get_query_result(query)
            .map_err(ContractError::StorageRead)?;
        Self::collect(results)
    }

    /// Sets one field from a raw string value (read-modify-write)
    pub fn update_field(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), ContractError> {
        let current = self.get(ctx, id)?;
        let updated = record::with_field(&current, field, value)?;
        self.put(ctx, &updated)?;
        info!(kind = R::KIND, id = %id, field = %field, tx_id = %ctx.tx_id(), "Record updated");
        Ok(())
    }

    pub fn change_owner(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        new_owner: &str,
    ) -> Result<(), ContractError> {
        let owner_field = R::OWNER_FIELD.ok_or_else(|| {
            ContractError::InvalidArgument(format!("The {} record has no owner", R::KIND))
        })?;
        self.update_field(ctx, id, owner_field, new_owner)
    }

    /// Adds `delta` to, or removes it from, the record's count.
    ///
    /// `delta` must be positive, and a pop may not take the count below zero.
    pub fn adjust_count(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        delta: i64,
        direction: Direction,
    ) -> Result<R, ContractError> {
        if delta <= 0 {
            return Err(ContractError::InvalidCount { delta });
        }

        let mut item = self.get(ctx, id)?;
        let current = item.count();

        let next = match direction {
            Direction::Push => current.checked_add(delta).ok_or_else(|| {
                ContractError::InvalidArgument(format!(
                    "Count overflow. {} + {} exceeds the maximum",
                    current, delta
                ))
            })?,
            Direction::Pop => {
                if current < delta {
                    return Err(ContractError::InsufficientCount {
                        current,
                        requested: delta,
                    });
                }
                current - delta
            }
        };

        item.set_count(next);
        self.put(ctx, &item)?;
        debug!(
            kind = R::KIND,
            id = %id,
            field = R::COUNT_FIELD,
            from = current,
            to = next,
            "Count adjusted"
        );
        Ok(item)
    }

    pub fn push_count(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        delta: i64,
    ) -> Result<R, ContractError> {
        self.adjust_count(ctx, id, delta, Direction::Push)
    }

    pub fn pop_count(
        &self,
        ctx: &mut TransactionContext<'_>,
        id: &str,
        delta: i64,
    ) -> Result<R, ContractError> {
        self.adjust_count(ctx, id, delta, Direction::Pop)
    }

    /// Removes a record; fails if it does not currently exist
    pub fn delete(&self, ctx: &mut TransactionContext<'_>, id: &str) -> Result<(), ContractError> {
        self.get(ctx, id)?;
        ctx.stub_mut()
            .del_state(id)
            .map_err(ContractError::StorageDelete)?;
        info!(kind = R::KIND, id = %id, tx_id = %ctx.tx_id(), "Record deleted");
        Ok(())
    }

    /// Every committed version of `id`, oldest first, without deletions
    pub fn history(&self, ctx: &TransactionContext<'_>, id: &str) -> Result<Vec<R>, ContractError> {
        let results = ctx
            .stub()
            .get_history_for_key(id)
            .map_err(ContractError::StorageRead)?;

        let mut versions = Vec::new();
        for modification in results {
            let modification = modification.map_err(ContractError::StorageRead)?;
            if modification.is_delete {
                continue;
            }
            versions.push(record::decode(&modification.value)?);
        }
        Ok(versions)
    }

    fn put(&self, ctx: &mut TransactionContext<'_>, item: &R) -> Result<(), ContractError> {
        let bytes = record::encode(item)?;
        ctx.stub_mut()
            .put_state(item.id(), bytes)
            .map_err(ContractError::StorageWrite)
    }

    fn collect(results: ResultsIterator<'_, KeyValue>) -> Result<Vec<R>, ContractError> {
        let mut items = Vec::new();
        for entry in results {
            let entry = entry.map_err(ContractError::StorageRead)?;
            items.push(record::decode(&entry.value)?);
        }
        Ok(items)
    }
}

impl<R: Record> Default for RecordContract<R> {
    fn default() -> Self {
        Self::new()
    }
}
