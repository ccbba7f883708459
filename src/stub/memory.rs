//! In-memory host used for development and tests.
//!
//! `MemoryWorldState` holds the committed key space and per-key history.
//! `MemoryStub` is the view one transaction gets of it: reads go to the
//! committed state, writes are buffered until the ledger commits them.

use super::{ChaincodeStub, KeyModification, KeyValue, ResultsIterator, StubError};
use crate::query::RichQuery;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Buffered writes of one transaction (`None` marks a deletion)
pub type WriteSet = BTreeMap<String, Option<Vec<u8>>>;

/// Flavour of state database the host emulates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateDatabase {
    /// Key-value only; rich queries are rejected
    GoLevelDb,
    /// Document store; rich queries are answered with selectors
    #[default]
    CouchDb,
}

impl StateDatabase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateDatabase::GoLevelDb => "goleveldb",
            StateDatabase::CouchDb => "couchdb",
        }
    }

    pub fn supports_rich_query(&self) -> bool {
        matches!(self, StateDatabase::CouchDb)
    }
}

impl fmt::Display for StateDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateDatabase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "goleveldb" | "leveldb" => Ok(StateDatabase::GoLevelDb),
            "couchdb" => Ok(StateDatabase::CouchDb),
            other => Err(format!(
                "unknown state database '{}' (expected goleveldb or couchdb)",
                other
            )),
        }
    }
}

/// Committed world state of one chaincode namespace
pub struct MemoryWorldState {
    /// Current values, ordered by key for range scans
    state: RwLock<BTreeMap<String, Vec<u8>>>,

    /// Every committed version per key, oldest first
    history: DashMap<String, Vec<KeyModification>>,

    /// Iterators handed out and not yet released
    open_iterators: Arc<AtomicUsize>,

    database: StateDatabase,
}

impl MemoryWorldState {
    pub fn new(database: StateDatabase) -> Self {
        Self {
            state: RwLock::new(BTreeMap::new()),
            history: DashMap::new(),
            open_iterators: Arc::new(AtomicUsize::new(0)),
            database,
        }
    }

    pub fn database(&self) -> StateDatabase {
        self.database
    }

    /// Committed value for `key`
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StubError> {
        let state = self.read_state()?;
        Ok(state.get(key).cloned())
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.read_state().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterators currently held by callers
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    /// Applies a transaction's write set and records one history entry per key.
    ///
    /// Returns the number of keys written.
    pub fn apply(
        &self,
        tx_id: &str,
        timestamp: DateTime<Utc>,
        writes: WriteSet,
    ) -> Result<usize, StubError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StubError::Backend("world state lock poisoned".to_string()))?;

        let count = writes.len();
        for (key, value) in writes {
            let modification = match value {
                Some(value) => {
                    state.insert(key.clone(), value.clone());
                    KeyModification {
                        tx_id: tx_id.to_string(),
                        value,
                        timestamp,
                        is_delete: false,
                    }
                }
                None => {
                    state.remove(&key);
                    KeyModification {
                        tx_id: tx_id.to_string(),
                        value: Vec::new(),
                        timestamp,
                        is_delete: true,
                    }
                }
            };
            self.history.entry(key).or_default().push(modification);
        }

        Ok(count)
    }

    fn read_state(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>, StubError> {
        self.state
            .read()
            .map_err(|_| StubError::Backend("world state lock poisoned".to_string()))
    }

    fn range(&self, start_key: &str, end_key: &str) -> Result<Vec<KeyValue>, StubError> {
        if !end_key.is_empty() && start_key > end_key {
            return Err(StubError::InvalidKey(format!(
                "start key '{}' sorts after end key '{}'",
                start_key, end_key
            )));
        }

        let lower = if start_key.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start_key.to_string())
        };
        let upper = if end_key.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end_key.to_string())
        };

        let state = self.read_state()?;
        Ok(state
            .range((lower, upper))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    fn query(&self, query: &str) -> Result<Vec<KeyValue>, StubError> {
        if !self.database.supports_rich_query() {
            return Err(StubError::Unsupported(format!(
                "rich queries require couchdb, state database is {}",
                self.database
            )));
        }

        let query =
            RichQuery::parse(query).map_err(|e| StubError::InvalidQuery(e.to_string()))?;

        let state = self.read_state()?;
        // Values that are not JSON documents cannot be matched by a selector
        let documents: Vec<(KeyValue, Value)> = state
            .iter()
            .filter_map(|(key, value)| {
                serde_json::from_slice::<Value>(value).ok().map(|doc| {
                    (
                        KeyValue {
                            key: key.clone(),
                            value: value.clone(),
                        },
                        doc,
                    )
                })
            })
            .collect();

        Ok(query.run(documents))
    }

    fn history_for(&self, key: &str) -> Vec<KeyModification> {
        self.history
            .get(key)
            .map(|versions| versions.clone())
            .unwrap_or_default()
    }

    fn track<T: 'static>(&self, rows: Vec<T>) -> ResultsIterator<'static, T> {
        self.open_iterators.fetch_add(1, Ordering::SeqCst);
        let open = Arc::clone(&self.open_iterators);
        ResultsIterator::from_rows(rows).with_close_hook(move || {
            open.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl Default for MemoryWorldState {
    fn default() -> Self {
        Self::new(StateDatabase::default())
    }
}

/// One transaction's view of a [`MemoryWorldState`]
pub struct MemoryStub<'a> {
    world: &'a MemoryWorldState,
    tx_id: String,
    timestamp: DateTime<Utc>,
    writes: WriteSet,
}

impl<'a> MemoryStub<'a> {
    pub fn new(world: &'a MemoryWorldState, tx_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            world,
            tx_id: tx_id.into(),
            timestamp,
            writes: WriteSet::new(),
        }
    }

    /// Number of keys this transaction will write on commit
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub fn into_write_set(self) -> WriteSet {
        self.writes
    }

    fn validate_key(key: &str) -> Result<(), StubError> {
        if key.is_empty() {
            return Err(StubError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(())
    }
}

impl ChaincodeStub for MemoryStub<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StubError> {
        self.world.get(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StubError> {
        Self::validate_key(key)?;
        if value.is_empty() {
            return Err(StubError::InvalidValue(format!(
                "value for key '{}' must not be empty",
                key
            )));
        }
        debug!(tx_id = %self.tx_id, key = %key, bytes = value.len(), "PutState");
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn del_state(&mut self, key: &str) -> Result<(), StubError> {
        Self::validate_key(key)?;
        debug!(tx_id = %self.tx_id, key = %key, "DelState");
        self.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, StubError> {
        let rows = self.world.range(start_key, end_key)?;
        Ok(self.world.track(rows))
    }

    fn get_query_result(&self, query: &str) -> Result<ResultsIterator<'_, KeyValue>, StubError> {
        let rows = self.world.query(query)?;
        Ok(self.world.track(rows))
    }

    fn get_history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, StubError> {
        Self::validate_key(key)?;
        let rows = self.world.history_for(key);
        Ok(self.world.track(rows))
    }
}
