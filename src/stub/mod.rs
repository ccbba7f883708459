//! Host ledger boundary.
//!
//! Contracts never touch storage directly: every read, write, scan and
//! history lookup goes through [`ChaincodeStub`]. The in-memory host in
//! [`memory`] implements it for development and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod iterator;
pub mod memory;


pub use iterator::ResultsIterator;
pub use memory::{MemoryStub, MemoryWorldState, StateDatabase, WriteSet};

/// One key/value pair returned by a range scan or rich query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed version of a key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyModification {
    /// Transaction that wrote this version
    #[serde(rename = "txId")]
    pub tx_id: String,

    /// Value written (empty for deletions)
    pub value: Vec<u8>,

    /// Commit timestamp of the writing transaction
    pub timestamp: DateTime<Utc>,

    /// True if this version removed the key
    #[serde(rename = "isDelete")]
    pub is_delete: bool,
}

/// Errors raised by the host ledger
#[derive(Debug, Clone, PartialEq)]
pub enum StubError {
    /// Storage backend failure
    Backend(String),
    /// Capability not offered by the configured state database
    Unsupported(String),
    /// Rich query expression could not be parsed or evaluated
    InvalidQuery(String),
    /// Key rejected by the host
    InvalidKey(String),
    /// Value rejected by the host
    InvalidValue(String),
}

impl fmt::Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubError::Backend(msg) => write!(f, "{}", msg),
            StubError::Unsupported(msg) => write!(f, "not supported: {}", msg),
            StubError::InvalidQuery(msg) => write!(f, "invalid query: {}", msg),
            StubError::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
            StubError::InvalidValue(msg) => write!(f, "invalid value: {}", msg),
        }
    }
}

impl std::error::Error for StubError {}

/// The narrow interface a contract uses to reach the world state.
///
/// Reads observe the state committed before the current transaction.
/// Writes are buffered by the host and become visible only once the
/// transaction commits.
pub trait ChaincodeStub {
    /// Identifier of the running transaction
    fn tx_id(&self) -> &str;

    /// Timestamp assigned to the running transaction
    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Returns the committed value for `key`, or `None` if absent
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StubError>;

    /// Writes `value` under `key` when the transaction commits
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StubError>;

    /// Removes `key` when the transaction commits
    fn del_state(&mut self, key: &str) -> Result<(), StubError>;

    /// Scans keys in `[start_key, end_key)` in key order.
    ///
    /// An empty `start_key` starts at the first key; an empty `end_key`
    /// runs to the last one.
    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<ResultsIterator<'_, KeyValue>, StubError>;

    /// Runs a backend-specific rich query
    fn get_query_result(&self, query: &str) -> Result<ResultsIterator<'_, KeyValue>, StubError>;

    /// Replays every committed version of `key`, oldest first
    fn get_history_for_key(
        &self,
        key: &str,
    ) -> Result<ResultsIterator<'_, KeyModification>, StubError>;
}

/// Per-invocation context handed to contract methods
pub struct TransactionContext<'a> {
    stub: &'a mut dyn ChaincodeStub,
}

impl<'a> TransactionContext<'a> {
    pub fn new(stub: &'a mut dyn ChaincodeStub) -> Self {
        Self { stub }
    }

    pub fn stub(&self) -> &(dyn ChaincodeStub + 'a) {
        &*self.stub
    }

    pub fn stub_mut(&mut self) -> &mut (dyn ChaincodeStub + 'a) {
        &mut *self.stub
    }

    pub fn tx_id(&self) -> &str {
        self.stub.tx_id()
    }
}
